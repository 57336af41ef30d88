use ometa_derive::Grammar;
use ometa_runtime::{Bindings, Input, Interpreter, Value};

#[derive(Grammar)]
#[grammar_inline = "digits = <digit+>:ds -> int(ds, 10)"]
struct Digits;

#[derive(Grammar)]
#[grammar_file = "tests/csv.ometa"]
struct Csv;

#[test]
fn inline_grammar() {
    let grammar = Digits::grammar().unwrap();
    let compiled = ometa::compile("digits = <digit+>:ds -> int(ds, 10)", "Digits").unwrap();
    assert_eq!(grammar, compiled);

    let interp = Interpreter::new(&grammar, Bindings::prelude()).unwrap();
    let out = interp.parse("digits", Input::Text("0042"), vec![]).unwrap();
    assert_eq!(out, Value::Int(42));
}

#[test]
fn grammar_file() {
    let grammar = Csv::grammar().unwrap();
    assert_eq!(grammar.name(), Some("Csv"));
    assert_eq!(grammar.rules().len(), 4);

    let interp = Interpreter::new(&grammar, Bindings::prelude()).unwrap();
    let out = interp.parse("csv", Input::Text("1,2\n3\n"), vec![]).unwrap();
    let ints = |ns: &[i64]| Value::list(ns.iter().map(|n| Value::Int(*n)).collect());
    assert_eq!(out, Value::list(vec![ints(&[1, 2]), ints(&[3])]));
}
