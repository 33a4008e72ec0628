//! Tests for the JSON debugging dump of the program tree.

use latc_parser::{parse, tokenize};

#[test]
fn test_program_to_json_shape() {
    let tokens = tokenize("int main() { return 3; }").expect("tokenize failed");
    let program = parse(tokens).expect("parse failed");
    let json = program.to_json();

    assert_eq!(json["functions"][0]["name"], "main");
    assert_eq!(json["functions"][0]["return_type"], "Int");
    let ret = &json["functions"][0]["body"][0]["kind"]["Return"];
    assert_eq!(ret["kind"]["Int"], 3);
}

#[test]
fn test_class_json_shape() {
    let tokens = tokenize("class A extends B { int x; }").expect("tokenize failed");
    let program = parse(tokens).expect("parse failed");
    let json = program.to_json();

    assert_eq!(json["classes"][0]["name"], "A");
    assert_eq!(json["classes"][0]["superclass"], "B");
    assert_eq!(json["classes"][0]["fields"][0]["items"][0]["name"], "x");
}
