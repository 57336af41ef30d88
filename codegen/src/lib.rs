//! Rust source generation for grammar trees.
//!
//! The generated code rebuilds a tree through `TreeBuilder`, so whatever
//! loads it gets the same validation a parsed grammar goes through.

use log::debug;
use proc_macro2::{Literal as LitToken, TokenStream};
use quote::quote;

use ometa_grammar::{BuildError, Builder, InterleavePart, Literal, Mode, Node};

/// A builder whose output is the builder call that would produce the node,
/// in terms of a `TreeBuilder` bound to `b`.
#[derive(Debug, Default, Clone, Copy)]
pub struct RustBuilder;

fn int_tokens(n: i64) -> TokenStream {
    match n.checked_abs() {
        Some(abs) if n < 0 => {
            let lit = LitToken::i64_suffixed(abs);
            quote! { -#lit }
        }
        Some(abs) => {
            let lit = LitToken::i64_suffixed(abs);
            quote! { #lit }
        }
        None => quote! { ::std::i64::MIN },
    }
}

fn mode_tokens(mode: Mode) -> TokenStream {
    match mode {
        Mode::One => quote! { ::ometa_grammar::Mode::One },
        Mode::ZeroOrMore => quote! { ::ometa_grammar::Mode::ZeroOrMore },
        Mode::OneOrMore => quote! { ::ometa_grammar::Mode::OneOrMore },
        Mode::Optional => quote! { ::ometa_grammar::Mode::Optional },
    }
}

impl Builder for RustBuilder {
    type Output = TokenStream;

    fn apply(
        &self,
        rule: &str,
        context: &str,
        args: Vec<TokenStream>,
    ) -> Result<TokenStream, BuildError> {
        Ok(quote! { b.apply(#rule, #context, vec![#( #args ),*])? })
    }

    fn exactly(&self, literal: Literal) -> Result<TokenStream, BuildError> {
        let lit = match literal {
            Literal::Str(s) => quote! { ::ometa_grammar::Literal::Str(#s.to_owned()) },
            Literal::Int(n) => {
                let n = int_tokens(n);
                quote! { ::ometa_grammar::Literal::Int(#n) }
            }
        };
        Ok(quote! { b.exactly(#lit)? })
    }

    fn match_string(&self, s: &str) -> Result<TokenStream, BuildError> {
        Ok(quote! { b.match_string(#s)? })
    }

    fn many(&self, expr: TokenStream) -> Result<TokenStream, BuildError> {
        Ok(quote! { b.many(#expr)? })
    }

    fn many1(&self, expr: TokenStream) -> Result<TokenStream, BuildError> {
        Ok(quote! { b.many1(#expr)? })
    }

    fn optional(&self, expr: TokenStream) -> Result<TokenStream, BuildError> {
        Ok(quote! { b.optional(#expr)? })
    }

    fn or_(&self, exprs: Vec<TokenStream>) -> Result<TokenStream, BuildError> {
        Ok(quote! { b.or_(vec![#( #exprs ),*])? })
    }

    fn xor(&self, exprs: Vec<TokenStream>) -> Result<TokenStream, BuildError> {
        Ok(quote! { b.xor(vec![#( #exprs ),*])? })
    }

    fn sequence(&self, exprs: Vec<TokenStream>) -> Result<TokenStream, BuildError> {
        Ok(quote! { b.sequence(vec![#( #exprs ),*])? })
    }

    fn not_(&self, expr: TokenStream) -> Result<TokenStream, BuildError> {
        Ok(quote! { b.not_(#expr)? })
    }

    fn lookahead(&self, expr: TokenStream) -> Result<TokenStream, BuildError> {
        Ok(quote! { b.lookahead(#expr)? })
    }

    fn bind(&self, name: &str, expr: TokenStream) -> Result<TokenStream, BuildError> {
        Ok(quote! { b.bind(#name, #expr)? })
    }

    fn predicate(&self, code: &str) -> Result<TokenStream, BuildError> {
        Ok(quote! { b.predicate(#code)? })
    }

    fn action(&self, code: &str) -> Result<TokenStream, BuildError> {
        Ok(quote! { b.action(#code)? })
    }

    fn list_pattern(&self, expr: TokenStream) -> Result<TokenStream, BuildError> {
        Ok(quote! { b.list_pattern(#expr)? })
    }

    fn consumed_by(&self, expr: TokenStream) -> Result<TokenStream, BuildError> {
        Ok(quote! { b.consumed_by(#expr)? })
    }

    fn index_consumed_by(&self, expr: TokenStream) -> Result<TokenStream, BuildError> {
        Ok(quote! { b.index_consumed_by(#expr)? })
    }

    fn range(&self, low: char, high: char) -> Result<TokenStream, BuildError> {
        Ok(quote! { b.range(#low, #high)? })
    }

    fn interleave(
        &self,
        parts: Vec<InterleavePart<TokenStream>>,
    ) -> Result<TokenStream, BuildError> {
        let parts = parts.into_iter().map(|part| {
            let mode = mode_tokens(part.mode);
            let expr = part.expr;
            let name = match part.name {
                Some(name) => quote! { Some(#name.to_owned()) },
                None => quote! { None },
            };
            quote! { ::ometa_grammar::InterleavePart::new(#mode, #expr, #name) }
        });
        Ok(quote! { b.interleave(vec![#( #parts ),*])? })
    }

    fn rule(&self, name: &str, body: TokenStream) -> Result<TokenStream, BuildError> {
        Ok(quote! { b.rule(#name, #body)? })
    }

    fn make_grammar(&self, name: &str, rules: Vec<TokenStream>) -> Result<TokenStream, BuildError> {
        Ok(quote! { b.make_grammar(#name, vec![#( #rules ),*])? })
    }
}

/// The builder expression for `node`, valid where a `TreeBuilder` named `b`
/// is in scope and `?` can return a `BuildError`.
pub fn emit_body(node: &Node) -> Result<TokenStream, BuildError> {
    node.rebuild(&RustBuilder)
}

/// A `grammar()` function rebuilding `node`.
pub fn emit_fn(node: &Node) -> Result<TokenStream, BuildError> {
    let body = emit_body(node)?;
    Ok(quote! {
        pub fn grammar() -> ::std::result::Result<::ometa_grammar::Node, ::ometa_grammar::BuildError> {
            use ::ometa_grammar::Builder as _;
            let b = ::ometa_grammar::TreeBuilder::new();
            Ok(#body)
        }
    })
}

/// Render `node` as a Rust module body defining `grammar()`.
pub fn emit(node: &Node) -> Result<String, BuildError> {
    let name = node.name().unwrap_or("grammar");
    let source = format!(
        "// Generated by ometa from grammar `{}`. Do not edit.\n{}\n",
        name,
        emit_fn(node)?
    );
    debug!("emitted {} bytes for '{}'", source.len(), name);
    Ok(source)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ometa_grammar::{seed, TreeBuilder};

    struct TestCase {
        node: Node,
        out: TokenStream,
    }

    fn apply(rule: &str) -> Node {
        Node::Apply {
            rule: rule.to_owned(),
            context: "r".to_owned(),
            args: vec![],
        }
    }

    #[test]
    fn builder_calls() {
        let tests = vec![
            TestCase {
                node: Node::Exactly(Literal::Int(-5)),
                out: quote! { b.exactly(::ometa_grammar::Literal::Int(-5i64))? },
            },
            TestCase {
                node: Node::Exactly(Literal::Str("a\n".to_owned())),
                out: quote! { b.exactly(::ometa_grammar::Literal::Str("a\n".to_owned()))? },
            },
            TestCase {
                node: Node::Many(Box::new(apply("x"))),
                out: quote! { b.many(b.apply("x", "r", vec![])?)? },
            },
            TestCase {
                node: Node::Bind {
                    name: "n".to_owned(),
                    expr: Box::new(Node::Range('a', 'z')),
                },
                out: quote! { b.bind("n", b.range('a', 'z')?)? },
            },
            TestCase {
                node: Node::Interleave(vec![InterleavePart::new(
                    Mode::ZeroOrMore,
                    apply("x"),
                    Some("xs".to_owned()),
                )]),
                out: quote! {
                    b.interleave(vec![::ometa_grammar::InterleavePart::new(
                        ::ometa_grammar::Mode::ZeroOrMore,
                        b.apply("x", "r", vec![])?,
                        Some("xs".to_owned())
                    )])?
                },
            },
        ];

        for test in tests {
            let got = emit_body(&test.node).unwrap();
            assert_eq!(got.to_string(), test.out.to_string(), "node: {:?}", test.node);
        }
    }

    #[test]
    fn extreme_ints() {
        assert_eq!(int_tokens(i64::MIN).to_string(), quote! { ::std::i64::MIN }.to_string());
        assert_eq!(int_tokens(7).to_string(), quote! { 7i64 }.to_string());
    }

    #[test]
    fn emitted_module_shape() {
        let grammar = seed::parse_grammar("digits = digit+", "Digits", &TreeBuilder::new()).unwrap();
        let source = emit(&grammar).unwrap();

        assert!(source.starts_with("// Generated by ometa from grammar `Digits`."));
        let expected = quote! {
            pub fn grammar() -> ::std::result::Result<::ometa_grammar::Node, ::ometa_grammar::BuildError> {
                use ::ometa_grammar::Builder as _;
                let b = ::ometa_grammar::TreeBuilder::new();
                Ok(b.make_grammar("Digits", vec![
                    b.rule("digits", b.many1(b.apply("digit", "digits", vec![])?)?)?
                ])?)
            }
        };
        assert!(source.contains(&expected.to_string()), "source: {}", source);
    }
}
