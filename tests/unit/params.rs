//! Unit tests for query parameter encoding

use steamy::client::params::encode_query;
use steamy::client::{ParamValue, Params};
use steamy::params;

fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
    items
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[test]
fn test_lists_expand_with_indices() {
    let params = params! {
        "appids" => vec![730u32, 570, 440],
        "format" => "json",
    };
    assert_eq!(
        encode_query(&params),
        pairs(&[
            ("appids[0]", "730"),
            ("appids[1]", "570"),
            ("appids[2]", "440"),
            ("format", "json"),
        ])
    );
}

#[test]
fn test_empty_list_sends_nothing() {
    let params = params! { "appids" => Vec::<u32>::new() };
    assert!(encode_query(&params).is_empty());
}

#[test]
fn test_bools_and_floats() {
    let params = params! {
        "include_played_free_games" => false,
        "price" => 1.25,
    };
    assert_eq!(
        encode_query(&params),
        pairs(&[("include_played_free_games", "false"), ("price", "1.25")])
    );
}

#[test]
fn test_large_steam_ids_are_exact() {
    let params = params! { "steamid" => 76561198000000000u64 };
    assert_eq!(encode_query(&params), pairs(&[("steamid", "76561198000000000")]));
}

#[test]
fn test_duplicate_keys_keep_last_value() {
    let mut params = Params::new();
    params.insert("count".into(), ParamValue::from(1));
    params.insert("count".into(), ParamValue::from(2));
    assert_eq!(encode_query(&params), pairs(&[("count", "2")]));
}

#[test]
fn test_display_joins_lists() {
    let value = ParamValue::from(vec!["a", "b"]);
    assert_eq!(value.to_string(), "a,b");
}
