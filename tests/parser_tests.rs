//! Annotation parser tests
//!
//! End-to-end behavior of `Parser::parse` against realistic comment blocks:
//! tolerant key scanning, strict typed values, condensation and custom types.

use std::sync::{Arc, RwLock};

use docnote::{AnnotationBag, Coerce, Entry, Parser, ParserError, ParserRules, TypeRegistry};
use serde_json::{json, Value};

fn single(bag: &AnnotationBag, key: &str) -> Value {
    bag.get(key)
        .and_then(Entry::as_single)
        .cloned()
        .unwrap_or_else(|| panic!("no single value under {key}"))
}

const STRONG_TYPED_BLOCK: &str = r#"/**
 * @value string abc
 * @value string 45
 * @value integer 45
 * @value integer -45
 * @value float .45
 * @value float 0.45
 * @value float 45.0
 * @value float -4.5
 * @value float 4.
 *
 * @json_value json ["x", "y"]
 * @json_value json {"x": {"y": "z"}}
 * @json_value json {"x": {"y": ["z", "p"]}}
 */"#;

const RESERVED_WORDS_BLOCK: &str = concat!(
    "/**\n",
    " * @value string\n",
    " * @value integer\n",
    " * @value float\n",
    " * @value json\n",
    " * @value_with_trailing_space string \n",
    " * @value_with_trailing_space integer \n",
    " * @value_with_trailing_space float \n",
    " * @value_with_trailing_space json \n",
    " */",
);

// =============================================================================
// Key scanning
// =============================================================================

mod scanning_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_block_without_identifier_is_empty() {
        let bag = Parser::new()
            .parse("/**\n * Plain description.\n * Nothing to see here.\n */")
            .unwrap();
        assert!(bag.is_empty());
        assert!(Parser::new().parse("").unwrap().is_empty());
    }

    #[test]
    fn test_tolerates_text_without_identifier() {
        let bag = Parser::new().parse("footype Tolerate me.").unwrap();
        assert!(bag.is_empty());
    }

    #[test]
    fn test_unrecognized_type_word_is_value_text() {
        let bag = Parser::new()
            .parse("/** @value footype Tolerate me. DockBlocks can't be evaluated rigidly. */")
            .unwrap();
        assert_eq!(
            single(&bag, "value"),
            json!("footype Tolerate me. DockBlocks can't be evaluated rigidly.")
        );
    }

    #[test]
    fn test_qualified_and_namespaced_keys() {
        let bag = Parser::new()
            .parse(" * @Acme\\Widget json {\"foo\": \"bar\"}\n * @cache.ttl 60")
            .unwrap();
        assert_eq!(single(&bag, "Acme\\Widget"), json!({"foo": "bar"}));
        assert_eq!(single(&bag.use_namespace("cache"), "ttl"), json!(60));
    }

    #[test]
    fn test_keys_keep_first_encounter_order() {
        let bag = Parser::new().parse("@b 1\n@a 2\n@b 3").unwrap();
        assert_eq!(bag.keys().collect::<Vec<_>>(), vec!["b", "a"]);
    }
}

// =============================================================================
// Implicit booleans
// =============================================================================

mod implicit_boolean_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_flag_at_end_of_line() {
        let bag = Parser::new().parse("@flag").unwrap();
        assert_eq!(single(&bag, "flag"), json!(true));
    }

    #[test]
    fn test_flag_followed_by_annotation() {
        let bag = Parser::new().parse("@flag @other").unwrap();
        assert_eq!(single(&bag, "flag"), json!(true));
        assert_eq!(single(&bag, "other"), json!(true));
    }

    #[test]
    fn test_flag_with_trailing_blank_space() {
        let bag = Parser::new().parse(" * @deprecated    \n").unwrap();
        assert_eq!(single(&bag, "deprecated"), json!(true));
    }

    #[test]
    fn test_repeated_flag_condenses_to_list() {
        let bag = Parser::new().parse("@x\n@x").unwrap();
        assert_eq!(bag.get("x"), Some(&Entry::Multiple(vec![json!(true), json!(true)])));
    }
}

// =============================================================================
// Type tags and coercion
// =============================================================================

mod coercion_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_strong_typed_values() {
        let bag = Parser::new().parse(STRONG_TYPED_BLOCK).unwrap();
        assert_eq!(
            bag.get_as_array("value"),
            vec![
                json!("abc"),
                json!("45"),
                json!(45),
                json!(-45),
                json!(0.45),
                json!(0.45),
                json!(45.0),
                json!(-4.5),
                json!(4.0),
            ]
        );
        assert_eq!(
            bag.get_as_array("json_value"),
            vec![
                json!(["x", "y"]),
                json!({"x": {"y": "z"}}),
                json!({"x": {"y": ["z", "p"]}}),
            ]
        );
    }

    #[test]
    fn test_reserved_words_as_values() {
        let bag = Parser::new().parse(RESERVED_WORDS_BLOCK).unwrap();
        let expected = vec![json!("string"), json!("integer"), json!("float"), json!("json")];
        assert_eq!(bag.get_as_array("value"), expected);
        assert_eq!(bag.get_as_array("value_with_trailing_space"), expected);
    }

    #[test]
    fn test_reserved_word_alone_is_string() {
        let bag = Parser::new().parse("@value string").unwrap();
        assert_eq!(single(&bag, "value"), json!("string"));
    }

    #[test]
    fn test_strict_integer() {
        let err = Parser::new().parse("@count integer abc").unwrap_err();
        assert_eq!(
            err,
            ParserError::InvalidValue {
                expected: "integer".to_string(),
                raw: "abc".to_string(),
            }
        );

        let bag = Parser::new().parse("@count integer -45").unwrap();
        assert_eq!(single(&bag, "count"), json!(-45));
    }

    #[test]
    fn test_bad_values_abort_parse() {
        for block in [
            "/** @value json {x: 1} */",
            "/** @value integer 1.5 */",
            "/** @value float 1.5x */",
            "/** @value eval 1 / 0 */",
        ] {
            assert!(
                matches!(Parser::new().parse(block), Err(ParserError::InvalidValue { .. })),
                "{:?} should fail",
                block
            );
        }
    }

    #[test]
    fn test_error_echoes_expected_type_and_raw_text() {
        let err = Parser::new().parse("@ratio float one half").unwrap_err();
        assert_eq!(err.type_name(), "float");
        assert_eq!(
            err.to_string(),
            "Raw value must be float. Invalid value 'one half' given"
        );
    }

    #[test]
    fn test_dynamic_json() {
        let bag = Parser::new().parse(r#"@data {"x":"y"}"#).unwrap();
        assert_eq!(single(&bag, "data"), json!({"x": "y"}));
    }

    #[test]
    fn test_dynamic_fallback_to_string() {
        let bag = Parser::new().parse("@data not json at all").unwrap();
        assert_eq!(single(&bag, "data"), json!("not json at all"));
    }

    #[test]
    fn test_dynamic_scalars() {
        let bag = Parser::new()
            .parse("@a 45\n@b 4.5\n@c true\n@d null\n@e \"quoted\"")
            .unwrap();
        assert_eq!(single(&bag, "a"), json!(45));
        assert_eq!(single(&bag, "b"), json!(4.5));
        assert_eq!(single(&bag, "c"), json!(true));
        assert_eq!(single(&bag, "d"), Value::Null);
        assert_eq!(single(&bag, "e"), json!("quoted"));
    }

    #[test]
    fn test_json_object_reencodes_to_source() {
        let source = r#"{"name":"widget","sizes":[1,2,3],"meta":{"active":true}}"#;
        let bag = Parser::new().parse(&format!("@config json {source}")).unwrap();
        let reencoded = serde_json::to_string(&single(&bag, "config")).unwrap();
        assert_eq!(
            serde_json::from_str::<Value>(&reencoded).unwrap(),
            serde_json::from_str::<Value>(source).unwrap()
        );
    }

    #[test]
    fn test_eval_values() {
        let bag = Parser::new()
            .parse(" * @timeout eval 60 * 5\n * @label eval upper('ok') + '!'\n * @sizes eval [1, 2] + [3]")
            .unwrap();
        assert_eq!(single(&bag, "timeout"), json!(300));
        assert_eq!(single(&bag, "label"), json!("OK!"));
        assert_eq!(single(&bag, "sizes"), json!([1, 2, 3]));
    }

    #[test]
    fn test_deeply_nested_eval_is_invalid_value() {
        for raw in [
            format!("{}1{}", "[".repeat(10_000), "]".repeat(10_000)),
            format!("{}1", "(".repeat(100_000)),
        ] {
            let err = Parser::new().parse(&format!("@v eval {raw}")).unwrap_err();
            assert!(
                matches!(&err, ParserError::InvalidValue { expected, .. } if expected == "eval"),
                "{:?}",
                err.type_name()
            );
        }
    }

    #[test]
    fn test_unregistered_builtin_tag_is_unknown_type() {
        let mut parser = Parser::new();
        parser.unregister_type("integer");
        assert_eq!(
            parser.parse("@n integer 3").unwrap_err(),
            ParserError::UnknownType("integer".to_string())
        );
        // Without a value the word is still plain text
        assert_eq!(single(&parser.parse("@n integer").unwrap(), "n"), json!("integer"));
    }
}

// =============================================================================
// Condensation
// =============================================================================

mod condensation_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_single_value_is_bare() {
        let bag = Parser::new().parse("@one 1").unwrap();
        assert_eq!(bag.get("one"), Some(&Entry::Single(json!(1))));
    }

    #[test]
    fn test_repeated_values_keep_encounter_order() {
        let bag = Parser::new()
            .parse("/**\n * @tag first\n * @other x\n * @tag second\n * @tag third\n */")
            .unwrap();
        let entry = bag.get("tag").unwrap();
        assert!(entry.is_multiple());
        assert_eq!(
            entry.values(),
            &[json!("first"), json!("second"), json!("third")]
        );
    }

    #[test]
    fn test_serialized_bag_shape() {
        let bag = Parser::new().parse("@a 1\n@b x\n@b y").unwrap();
        assert_eq!(
            serde_json::to_value(&bag).unwrap(),
            json!({"a": 1, "b": ["x", "y"]})
        );
    }
}

// =============================================================================
// Custom types
// =============================================================================

mod custom_type_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    struct Percent;

    impl Coerce for Percent {
        fn coerce(&self, raw: &str) -> Result<Value, ParserError> {
            raw.trim()
                .strip_suffix('%')
                .and_then(|n| n.trim().parse::<f64>().ok())
                .map(|n| json!(n / 100.0))
                .ok_or_else(|| ParserError::invalid_value("percent", raw))
        }
    }

    #[test]
    fn test_register_and_unregister() {
        let docblock = "/** @value foo bar */";
        let mut parser = Parser::new();

        assert_eq!(single(&parser.parse(docblock).unwrap(), "value"), json!("foo bar"));

        parser
            .register_type("foo", |raw: &str| Ok(json!(format!("this foo is {raw}"))))
            .unwrap();
        assert_eq!(
            single(&parser.parse(docblock).unwrap(), "value"),
            json!("this foo is bar")
        );

        assert!(parser.unregister_type("foo").is_some());
        assert_eq!(single(&parser.parse(docblock).unwrap(), "value"), json!("foo bar"));
    }

    #[test]
    fn test_registered_coercer_struct() {
        let mut registry = TypeRegistry::new();
        registry.register_coercer("percent", Percent).unwrap();
        let parser = Parser::with_registry(ParserRules::default(), registry);

        let bag = parser.parse("@load percent 75%").unwrap();
        assert_eq!(single(&bag, "load"), json!(0.75));
        assert_eq!(
            parser.parse("@load percent lots").unwrap_err(),
            ParserError::invalid_value("percent", "lots")
        );
    }

    #[test]
    fn test_custom_type_can_shadow_builtin() {
        let mut parser = Parser::new();
        parser
            .register_type("string", |raw: &str| Ok(json!(raw.len())))
            .unwrap();
        assert_eq!(single(&parser.parse("@v string abcd").unwrap(), "v"), json!(4));
    }

    #[test]
    fn test_shared_parser_behind_lock() {
        let parser = Arc::new(RwLock::new(Parser::new()));

        let writer = {
            let parser = Arc::clone(&parser);
            std::thread::spawn(move || {
                parser
                    .write()
                    .unwrap()
                    .register_type("twice", |raw: &str| Ok(json!(format!("{raw}{raw}"))))
                    .unwrap();
            })
        };
        writer.join().unwrap();

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let parser = Arc::clone(&parser);
                std::thread::spawn(move || parser.read().unwrap().parse("@v twice ab").unwrap())
            })
            .collect();
        for reader in readers {
            assert_eq!(single(&reader.join().unwrap(), "v"), json!("abab"));
        }
    }
}

// =============================================================================
// Custom grammar
// =============================================================================

mod grammar_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_custom_identifier_and_name_pattern() {
        let rules = ParserRules::new('%', r"[a-z]+").unwrap();
        let bag = Parser::with_rules(rules)
            .parse(" * %route /users\n * %get %auth\n * @ignored value")
            .unwrap();
        assert_eq!(bag.keys().collect::<Vec<_>>(), vec!["route", "get", "auth"]);
    }

    #[test]
    fn test_convenience_parse_uses_defaults() {
        let bag = docnote::parse("@ok").unwrap();
        assert_eq!(single(&bag, "ok"), json!(true));
    }
}
