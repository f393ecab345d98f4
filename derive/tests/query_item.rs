use std::borrow::Cow;
use std::fmt;

use oscloud::QueryItem;
use oscloud_derive::QueryItem;

#[derive(Debug)]
struct Region(&'static str);

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.to_ascii_uppercase())
    }
}

#[derive(Debug, QueryItem)]
enum ContainerFilter {
    Prefix(String),
    Limit(u32),
    Enabled(bool),
    Region(Region),
    #[query_item = "end_marker"]
    Before(String),
    ChangesSince(String),
}

fn pair(item: ContainerFilter) -> (String, String) {
    let (key, value) = item.query_item().unwrap();
    (key.to_string(), value.into_owned())
}

#[test]
fn test_keys_and_values() {
    let cases = vec![
        (ContainerFilter::Prefix("logs/".into()), ("prefix", "logs/")),
        (ContainerFilter::Limit(100), ("limit", "100")),
        (ContainerFilter::Enabled(false), ("enabled", "false")),
        (ContainerFilter::Region(Region("dfw")), ("region", "DFW")),
        (ContainerFilter::Before("z".into()), ("end_marker", "z")),
        (
            ContainerFilter::ChangesSince("2024-01-01".into()),
            ("changes_since", "2024-01-01"),
        ),
    ];
    for (item, (key, value)) in cases {
        assert_eq!(pair(item), (key.to_string(), value.to_string()));
    }
}

#[test]
fn test_strings_are_borrowed() {
    let item = ContainerFilter::Prefix("images/".into());
    let (_, value) = item.query_item().unwrap();
    assert!(matches!(value, Cow::Borrowed("images/")));
}
