use wasm_bindgen::JsValue;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DateStyle {
    #[default]
    Long,
    Short,
}

impl DateStyle {
    /// `Intl.DateTimeFormat` options for the style.
    pub fn options(self) -> &'static [(&'static str, &'static str)] {
        match self {
            DateStyle::Long => &[
                ("weekday", "long"),
                ("year", "numeric"),
                ("month", "long"),
                ("day", "numeric"),
            ],
            DateStyle::Short => &[("month", "short"), ("day", "numeric"), ("year", "numeric")],
        }
    }
}

/// Today's date in the browser's locale.
pub fn format_today(style: DateStyle) -> String {
    let options = js_sys::Object::new();
    for (key, value) in style.options() {
        let _ = js_sys::Reflect::set(
            &options,
            &JsValue::from_str(key),
            &JsValue::from_str(value),
        );
    }
    js_sys::Date::new_0()
        .to_locale_date_string("default", &options)
        .into()
}
