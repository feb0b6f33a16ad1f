// Copyright 2022 OpenStax Poland
// Licensed under the MIT license. See LICENSE file in the project root for
// full license text.

/// `match` over string literals, ignoring ASCII case
///
/// ```ignore
/// match_ignore_ascii_case! { word;
///     "AM" => Some(false),
///     "PM" | "p.m" => Some(true),
///     _ => None,
/// }
/// ```
macro_rules! match_ignore_ascii_case {
    ($value:expr; $($($pat:literal)|+ => $arm:expr,)* _ => $default:expr $(,)?) => {{
        let value: &str = $value;
        $(
            if false $(|| value.eq_ignore_ascii_case($pat))+ {
                $arm
            } else
        )* {
            $default
        }
    }};
}

/// Declare a structured report schema: a struct with one [`ReportRow`] field
/// per known key, in display order
///
/// The `source` and `unparsed` rows are added to every schema.
///
/// [`ReportRow`]: crate::report::ReportRow
macro_rules! report_schema {
    (
        $(#[$meta:meta])*
        pub struct $name:ident($header:literal) {
            $($field:ident: $key:literal => $label:literal,)*
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
        pub struct $name {
            $(pub $field: $crate::report::ReportRow,)*
            /// The report as received
            pub source: $crate::report::ReportRow,
            /// `key:value;` pairs with unknown keys
            pub unparsed: $crate::report::ReportRow,
        }

        impl Default for $name {
            fn default() -> Self {
                $name {
                    $($field: $crate::report::ReportRow::new($key, $label, $header),)*
                    source: $crate::report::ReportRow::new("source", "Source header", $header),
                    unparsed: $crate::report::ReportRow::new("unparsed", "Unknown fields", $header),
                }
            }
        }

        impl $crate::report::Report for $name {
            const HEADER_NAME: &'static str = $header;

            fn rows(&self) -> Vec<&$crate::report::ReportRow> {
                vec![$(&self.$field,)* &self.source, &self.unparsed]
            }

            fn fields_mut(&mut self) -> Vec<&mut $crate::report::ReportRow> {
                vec![$(&mut self.$field),*]
            }

            fn source_mut(&mut self) -> &mut $crate::report::ReportRow {
                &mut self.source
            }

            fn unparsed_mut(&mut self) -> &mut $crate::report::ReportRow {
                &mut self.unparsed
            }
        }
    };
}
