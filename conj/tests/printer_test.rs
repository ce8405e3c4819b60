use conj::abstractions::{hash_map, hash_set, with_meta};
use conj::{
    Keyword, List, Map, PrintOptions, Seq, Set, Symbol, Value, Vector, keyword, list, lrepr, map,
    set, symbol, vector,
};

fn ints(ns: &[i64]) -> Vec<Value> {
    ns.iter().copied().map(Value::Int).collect()
}

#[test]
fn test_empty_collections() {
    assert_eq!(Vector::<Value>::new().to_string(), "[]");
    assert_eq!(List::<Value>::new().to_string(), "()");
    assert_eq!(Seq::<Value>::new().to_string(), "()");
    assert_eq!(Map::<Value, Value>::new().to_string(), "{}");
    assert_eq!(Set::<Value>::new().to_string(), "#{}");
}

#[test]
fn test_canonical_formats() {
    assert_eq!(vector(ints(&[1, 2, 3])).to_string(), "[1 2 3]");
    assert_eq!(list(ints(&[1, 2, 3])).to_string(), "(1 2 3)");
    assert_eq!(Seq::lazy(ints(&[1, 2])).to_string(), "(1 2)");
    assert_eq!(set(ints(&[4])).to_string(), "#{4}");

    let m = map([(Value::from(keyword("a")), Value::Int(1))]);
    assert_eq!(m.to_string(), "{:a 1}");
}

#[test]
fn test_map_entries_separated_by_comma() {
    let m = hash_map([
        (Value::Int(1), Value::Int(2)),
        (Value::Int(3), Value::Int(4)),
    ]);
    let printed = m.to_string();
    assert!(printed == "{1 2, 3 4}" || printed == "{3 4, 1 2}", "{printed}");
}

#[test]
fn test_set_order_is_deterministic() {
    let s = hash_set(ints(&[5, 9, 13, 40, 2]));
    assert_eq!(s.to_string(), s.to_string());
    assert_eq!(s.clone().to_string(), s.to_string());
}

#[test]
fn test_symbols_and_keywords() {
    assert_eq!(Value::from(symbol("x")).to_string(), "x");
    assert_eq!(Value::from(Symbol::namespaced("core", "map")).to_string(), "core/map");
    assert_eq!(Value::from(Keyword::namespaced("user", "k")).to_string(), ":user/k");
}

#[test]
fn test_nested_representation() {
    let inner = Value::Vector(vector(ints(&[2, 3])));
    let outer = Value::List(list([Value::Int(1), inner, Value::str("x")]));
    assert_eq!(outer.to_string(), "(1 [2 3] \"x\")");

    let plain = PrintOptions {
        print_readably: false,
        ..PrintOptions::default()
    };
    assert_eq!(lrepr(&outer, &plain), "(1 [2 3] x)");
}

#[test]
fn test_print_length_on_infinite_seq() {
    let naturals = Value::Seq(Seq::lazy((0..).map(Value::Int)));
    let opts = PrintOptions {
        print_length: Some(3),
        ..PrintOptions::default()
    };
    assert_eq!(lrepr(&naturals, &opts), "(0 1 2 ...)");
}

#[test]
fn test_print_meta_on_nested_values() {
    let meta = map([(Value::from(keyword("line")), Value::Int(1))]);
    let v = with_meta(&Value::Vector(vector(ints(&[1]))), meta).unwrap();
    let opts = PrintOptions {
        print_meta: true,
        ..PrintOptions::default()
    };
    let outer = Value::Vector(vector([v]));
    assert_eq!(lrepr(&outer, &opts), "[^{:line 1} [1]]");
    assert_eq!(outer.to_string(), "[[1]]");
}
