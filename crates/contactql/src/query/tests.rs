//! Tests for query parsing and validation.

use super::*;
use crate::assets::{
    Field, FieldReference, FieldType, Flow, Group, GroupReference, StaticResolver,
};
use crate::env::{Environment, RedactionPolicy};

// ==================== Test Helpers ====================

fn resolver() -> StaticResolver {
    StaticResolver::new(
        vec![
            Field::new("f1b5aea6-6586-41c7-9020-1a6326cc6565", "age", "Age", FieldType::Number),
            Field::new("3810a485-3fda-4011-a589-7320c0b8dbef", "dob", "DOB", FieldType::Datetime),
            Field::new("d66a7823-eada-40e5-9a3a-57239d4690bf", "gender", "Gender", FieldType::Text),
            Field::new("67663ad1-3abc-42dd-a162-09df2dea66ec", "state", "State", FieldType::State),
            Field::new("3b12f8f1-6fe0-4a68-8c2e-1b1c2d3e4f50", "name", "Nom", FieldType::Text),
        ],
        vec![
            Group::new("8de30b78-d9ef-4db2-b2e8-4f7b6aef64cf", "U-Reporters"),
            Group::new("cf51cf8d-94da-447a-b27e-a42a900c37a6", "Testers"),
        ],
        vec![Flow::new("ed9e2ea6-ccc5-4f86-8d6c-7d25a5e4ba24", "Registration")],
    )
}

/// Parses with a resolver and returns the canonical form.
fn canonical(text: &str) -> String {
    let resolver = resolver();
    let env = Environment::default();
    parse_query(&env, text, Some(&resolver)).unwrap().to_string()
}

fn parse_error(text: &str) -> QueryError {
    let resolver = resolver();
    let env = Environment::default();
    parse_query(&env, text, Some(&resolver)).unwrap_err()
}

fn redacted_env() -> Environment {
    Environment::default().with_redaction_policy(RedactionPolicy::Urns)
}

fn assert_send_sync<T: Send + Sync>() {}

fn root_condition<'q>(query: &'q ContactQuery<'_>) -> &'q Condition {
    match query.root() {
        QueryNode::Condition(c) => c,
        QueryNode::BoolCombination(_) => panic!("expected a single condition"),
    }
}

// ==================== Implicit Condition Tests ====================

#[test]
fn test_parse_implicit_name() {
    assert_eq!(canonical("will"), r#"name ~ "will""#);
    assert_eq!(canonical("wi"), r#"name ~ "wi""#);
    assert_eq!(canonical("w"), r#"name = "w""#);
    assert_eq!(canonical(r#""Bob Smith""#), r#"name ~ "Bob Smith""#);
}

#[test]
fn test_parse_implicit_urn() {
    assert_eq!(canonical("tel:+12024561111"), r#"tel = "+12024561111""#);
    assert_eq!(canonical("twitter:bobby"), r#"twitter = "bobby""#);
    assert_eq!(canonical("mailto:bob@nyaruka.com"), r#"mailto = "bob@nyaruka.com""#);
}

#[test]
fn test_parse_implicit_phone_number() {
    assert_eq!(canonical("+12024561111"), r#"tel = "+12024561111""#);
    assert_eq!(canonical("0788-123"), "tel ~ 0788123");
    assert_eq!(canonical("+593131"), r#"tel ~ "+593131""#);
}

#[test]
fn test_parse_local_phone_number_uses_default_country() {
    let env = Environment::default().with_default_country("US");
    let query = parse_query(&env, "(202) 456-1111", None).unwrap();
    assert_eq!(query.to_string(), r#"tel = "+12024561111""#);

    let condition = root_condition(&query);
    assert_eq!(condition.property_type(), PropertyType::Scheme);
    assert_eq!(condition.value(), "+12024561111");
}

// ==================== Boolean Combination Tests ====================

#[test]
fn test_parse_implicit_and() {
    assert_eq!(
        canonical("will felix"),
        r#"name ~ "will" AND name ~ "felix""#
    );
}

#[test]
fn test_parse_explicit_and_or() {
    assert_eq!(
        canonical("will and felix"),
        r#"name ~ "will" AND name ~ "felix""#
    );
    assert_eq!(
        canonical("will or felix or matt"),
        r#"(name ~ "will" OR name ~ "felix") OR name ~ "matt""#
    );
}

#[test]
fn test_parse_precedence_with_implicit_and() {
    assert_eq!(
        canonical("will and felix or matt amber"),
        r#"(name ~ "will" AND name ~ "felix") OR (name ~ "matt" AND name ~ "amber")"#
    );
}

#[test]
fn test_parse_grouping() {
    assert_eq!(
        canonical(r#"(Age < 18 and Gender = "male") or (Age > 18 and Gender = "female")"#),
        r#"(age < 18 AND gender = "male") OR (age > 18 AND gender = "female")"#
    );
    assert_eq!(
        canonical("will AND (felix OR matt)"),
        r#"name ~ "will" AND (name ~ "felix" OR name ~ "matt")"#
    );
}

#[test]
fn test_parse_combination_children() {
    let resolver = resolver();
    let env = Environment::default();
    let query = parse_query(&env, "age > 18 OR gender = male", Some(&resolver)).unwrap();

    let QueryNode::BoolCombination(combination) = query.root() else {
        panic!("expected a combination");
    };
    assert_eq!(combination.operator(), BoolOperator::Or);
    assert_eq!(combination.children().len(), 2);
}

// ==================== Condition Tests ====================

#[test]
fn test_parse_conditions() {
    assert_eq!(canonical("Name=will"), r#"name = "will""#);
    assert_eq!(canonical(r#"Name ~ "felix""#), r#"name ~ "felix""#);
    assert_eq!(canonical("Name is will or Name has felix"), r#"name = "will" OR name ~ "felix""#);
    assert_eq!(canonical("age = 18.5"), "age = 18.5");
    assert_eq!(canonical("age >= -5"), "age >= -5");
    assert_eq!(canonical("dob <= 1981-05-28"), r#"dob <= "1981-05-28""#);
    assert_eq!(canonical("state = Kigali"), r#"state = "Kigali""#);
    assert_eq!(canonical("tickets > 0"), "tickets > 0");
    assert_eq!(canonical("id = 123"), "id = 123");
}

#[test]
fn test_parse_existence_checks() {
    assert_eq!(canonical(r#"name is """#), r#"name = """#);
    assert_eq!(canonical(r#"name != """#), r#"name != """#);
    assert_eq!(canonical(r#"tel = """#), r#"tel = """#);
    assert_eq!(canonical(r#"age != """#), r#"age != """#);
    assert_eq!(canonical(r#"last_seen_on = """#), r#"last_seen_on = """#);
    assert_eq!(canonical(r#"flow != """#), r#"flow != """#);
}

#[test]
fn test_parse_escaped_string() {
    assert_eq!(
        canonical(r#"name = "Bob ""B"" Smith""#),
        r#"name = "Bob ""B"" Smith""#
    );
}

#[test]
fn test_parse_property_prefixes() {
    let env = Environment::default();
    let query = parse_query(&env, "fields.tel = 12 AND urns.foo = bar", None).unwrap();
    assert_eq!(query.to_string(), r#"fields.tel = 12 AND urns.foo = "bar""#);

    // a field named like an attribute keeps its prefix
    assert_eq!(canonical("fields.name = bob"), r#"fields.name = "bob""#);
}

#[test]
fn test_parse_keyword_named_fields_keep_prefix() {
    let resolver = StaticResolver::new(
        vec![
            Field::new("1b3e3b4a-9bd5-4c38-a0a5-6e3a0f6c7c11", "has", "Has", FieldType::Number),
            Field::new("5f0c7e2d-2a41-4c0e-9d8b-0c6f1b2e3a44", "or", "Or", FieldType::Text),
            Field::new("8e2d6c1b-7f3a-4b5c-9a0d-1e2f3a4b5c66", "AND", "And", FieldType::Text),
            Field::new("c4d5e6f7-0a1b-4c2d-8e3f-4a5b6c7d8e99", "is", "Is", FieldType::Text),
        ],
        vec![],
        vec![],
    );
    let env = Environment::default();

    for (text, expected) in [
        ("fields.has = 5", "fields.has = 5"),
        ("fields.or = bob", r#"fields.or = "bob""#),
        ("fields.and != \"\"", r#"fields.and != """#),
        ("FIELDS.IS = x OR fields.has > 2", r#"fields.is = "x" OR fields.has > 2"#),
    ] {
        let query = parse_query(&env, text, Some(&resolver)).unwrap();
        assert_eq!(query.to_string(), expected);

        let reparsed = parse_query(&env, &query.to_string(), Some(&resolver)).unwrap();
        assert_eq!(reparsed.root(), query.root());
    }
}

#[test]
fn test_parse_classifies_properties() {
    let resolver = resolver();
    let env = Environment::default();
    let query = parse_query(&env, "age > 18", Some(&resolver)).unwrap();
    let condition = root_condition(&query);

    assert_eq!(condition.property_type(), PropertyType::Field);
    assert_eq!(condition.property_key(), "age");
    assert_eq!(condition.operator(), Operator::GreaterThan);
    assert_eq!(condition.value_type(), Some(FieldType::Number));
    assert_eq!(condition.field().unwrap().name, "Age");
    assert_eq!(condition.number(), Some(rust_decimal::Decimal::from(18)));

    let query = parse_query(&env, "created_on > 2020-01-01", Some(&resolver)).unwrap();
    let condition = root_condition(&query);
    assert_eq!(condition.property_type(), PropertyType::Attribute);
    assert_eq!(condition.value_type(), Some(FieldType::Datetime));
    assert!(condition.date().is_some());
}

#[test]
fn test_parse_group_name_is_normalized() {
    let resolver = resolver();
    let env = Environment::default();
    let query = parse_query(&env, "group = u-reporters", Some(&resolver)).unwrap();
    let condition = root_condition(&query);

    assert_eq!(condition.value(), "U-Reporters");
    assert_eq!(
        condition.group().unwrap().uuid,
        "8de30b78-d9ef-4db2-b2e8-4f7b6aef64cf"
    );
    assert_eq!(query.to_string(), r#"group = "U-Reporters""#);
}

#[test]
fn test_parse_flow_and_history() {
    assert_eq!(canonical("flow = registration"), r#"flow = "Registration""#);
    assert_eq!(canonical("history = REGISTRATION"), r#"history = "Registration""#);
}

#[test]
fn test_parse_language_and_status() {
    assert_eq!(canonical("language = ENG"), r#"language = "ENG""#);
    assert_eq!(canonical("status = blocked"), r#"status = "blocked""#);
}

#[test]
fn test_parse_without_resolver() {
    let env = Environment::default();
    let query = parse_query(&env, "xyz > abc AND group = gamers", None).unwrap();
    assert!(!query.is_resolved());
    assert_eq!(query.to_string(), r#"xyz > "abc" AND group = "gamers""#);
}

// ==================== Validation Error Tests ====================

#[test]
fn test_parse_invalid_literals() {
    assert_eq!(parse_error("age > xyz"), QueryError::invalid_number("xyz"));
    assert_eq!(parse_error("id = abc"), QueryError::invalid_number("abc"));
    assert_eq!(parse_error("dob > xyz"), QueryError::invalid_date("xyz"));
    assert_eq!(parse_error("created_on < 2020-02-30"), QueryError::invalid_date("2020-02-30"));
    assert_eq!(
        parse_error(r#"group != "Gamers""#),
        QueryError::InvalidGroup {
            value: "Gamers".to_string()
        }
    );
    assert_eq!(parse_error("flow = Survey").code(), "invalid_flow");
    assert_eq!(
        parse_error("language = english"),
        QueryError::InvalidLanguage {
            value: "english".to_string()
        }
    );
    assert_eq!(parse_error("status = deleted").code(), "invalid_status");
}

#[test]
fn test_parse_ordering_with_empty_value() {
    assert_eq!(parse_error(r#"age > """#).code(), "invalid_number");
    assert_eq!(parse_error(r#"dob < """#).code(), "invalid_date");
}

#[test]
fn test_parse_contains_errors() {
    assert_eq!(
        parse_error("name ~ w"),
        QueryError::InvalidPartialName {
            min_token_length: 2
        }
    );
    assert_eq!(
        parse_error(r#"name ~ "J. R.""#),
        QueryError::InvalidPartialName {
            min_token_length: 2
        }
    );
    assert_eq!(
        parse_error("tel ~ 12"),
        QueryError::InvalidPartialUrn {
            min_value_length: 3
        }
    );
    assert_eq!(parse_error("urn ~ ab").code(), "invalid_partial_urn");
    assert_eq!(parse_error("age ~ 18"), QueryError::unsupported_contains("age"));
    assert_eq!(parse_error("uuid ~ abc"), QueryError::unsupported_contains("uuid"));
}

#[test]
fn test_parse_comparison_errors() {
    assert_eq!(
        parse_error("name > bob"),
        QueryError::unsupported_comparison("name", ">")
    );
    assert_eq!(
        parse_error("gender <= male"),
        QueryError::unsupported_comparison("gender", "<=")
    );
    assert_eq!(parse_error("tel > 123").code(), "unsupported_comparison");
    assert_eq!(parse_error("state >= Kigali").code(), "unsupported_comparison");
}

#[test]
fn test_parse_setcheck_errors() {
    for text in [
        r#"uuid = """#,
        r#"id != """#,
        r#"created_on = """#,
        r#"group != """#,
    ] {
        assert_eq!(parse_error(text).code(), "unsupported_setcheck", "{}", text);
    }

    assert_eq!(
        parse_error(r#"id = """#),
        QueryError::UnsupportedSetCheck {
            property: "id".to_string(),
            operator: "=".to_string()
        }
    );
}

#[test]
fn test_parse_unknown_properties() {
    assert_eq!(
        parse_error("foo.bar = x"),
        QueryError::UnknownPropertyType {
            property_type: "foo".to_string()
        }
    );
    assert_eq!(parse_error("xyz = 1"), QueryError::unknown_property("xyz"));
    assert_eq!(parse_error("fields.xyz = 1"), QueryError::unknown_property("xyz"));
}

#[test]
fn test_parse_syntax_errors() {
    assert_eq!(parse_error("").code(), "syntax");
    assert_eq!(parse_error("name =").code(), "syntax");
    assert_eq!(parse_error("(name = bob").code(), "syntax");
    assert_eq!(parse_error("name = bob)"), QueryError::unexpected_token(")"));
    assert_eq!(parse_error("name = $"), QueryError::unexpected_token("$"));
    assert_eq!(parse_error("name = \"bob"), QueryError::unexpected_token("\""));
}

// ==================== Redaction Tests ====================

#[test]
fn test_parse_redacted_urns() {
    let env = redacted_env();

    for text in ["tel = 123", "twitter ~ bobby", "urn ~ 1234", "urns.tel = 123"] {
        assert_eq!(
            parse_query(&env, text, None).unwrap_err(),
            QueryError::RedactedUrns,
            "{}",
            text
        );
    }

    // existence checks are still allowed
    assert!(parse_query(&env, r#"tel != """#, None).is_ok());
    assert!(parse_query(&env, r#"urn = """#, None).is_ok());
}

#[test]
fn test_parse_redacted_implicit() {
    let env = redacted_env();

    let query = parse_query(&env, "12345", None).unwrap();
    assert_eq!(query.to_string(), "id = 12345");
    assert!(!query.inspect().allow_as_group);

    // URN-looking text is just a name search
    let query = parse_query(&env, "twitter:bobby", None).unwrap();
    assert_eq!(query.to_string(), r#"name ~ "twitter:bobby""#);

    let query = parse_query(&env, "0788-123", None).unwrap();
    assert_eq!(query.to_string(), r#"name ~ "0788-123""#);
}

// ==================== Inspection Tests ====================

#[test]
fn test_inspect_implicit_name() {
    let env = Environment::default();
    let inspection = parse_query(&env, "bob", None).unwrap().inspect();

    assert_eq!(inspection.attributes.iter().collect::<Vec<_>>(), vec!["name"]);
    assert!(inspection.schemes.is_empty());
    assert!(inspection.fields.is_empty());
    assert!(inspection.groups.is_empty());
    assert!(inspection.allow_as_group);
}

#[test]
fn test_inspect_mixed_query() {
    let text = r#"AGE > 18 AND name != "" OR twitter = bobby OR tel ~1234 AND tickets > 0"#;
    let env = Environment::default();

    let inspection = parse_query(&env, text, None).unwrap().inspect();
    assert_eq!(
        inspection.attributes.iter().collect::<Vec<_>>(),
        vec!["name", "tickets"]
    );
    assert_eq!(
        inspection.schemes.iter().collect::<Vec<_>>(),
        vec!["tel", "twitter"]
    );
    assert_eq!(inspection.fields, vec![FieldReference::new("age", "")]);
    assert!(inspection.allow_as_group);

    let resolver = resolver();
    let inspection = parse_query(&env, text, Some(&resolver)).unwrap().inspect();
    assert_eq!(inspection.fields, vec![FieldReference::new("age", "Age")]);
}

#[test]
fn test_inspect_dedupes_fields_and_groups() {
    let resolver = resolver();
    let env = Environment::default();
    let query = parse_query(
        &env,
        "age > 18 AND age < 30 AND group = testers OR group = TESTERS",
        Some(&resolver),
    )
    .unwrap();
    let inspection = query.inspect();

    assert_eq!(inspection.fields.len(), 1);
    assert_eq!(
        inspection.groups,
        vec![GroupReference::new(
            "cf51cf8d-94da-447a-b27e-a42a900c37a6",
            "Testers"
        )]
    );
    assert!(!inspection.allow_as_group);
}

#[test]
fn test_inspect_groups() {
    let env = Environment::default();

    let inspection = parse_query(&env, "group = U-reporters", None)
        .unwrap()
        .inspect();
    assert_eq!(inspection.groups, vec![GroupReference::variable("U-reporters")]);
    assert!(!inspection.allow_as_group);

    let resolver = resolver();
    let inspection = parse_query(&env, "group = U-reporters", Some(&resolver))
        .unwrap()
        .inspect();
    assert_eq!(
        inspection.groups,
        vec![GroupReference::new(
            "8de30b78-d9ef-4db2-b2e8-4f7b6aef64cf",
            "U-Reporters"
        )]
    );
}

#[test]
fn test_inspect_disallowed_attributes() {
    let resolver = resolver();
    let env = Environment::default();

    for text in [
        "id = 123",
        "status = active",
        "flow = Registration",
        "history = Registration",
        "group = Testers",
    ] {
        let inspection = parse_query(&env, text, Some(&resolver)).unwrap().inspect();
        assert!(!inspection.allow_as_group, "{}", text);
    }

    let inspection = parse_query(&env, r#"tel = "" OR tel != """#, None)
        .unwrap()
        .inspect();
    assert!(inspection.allow_as_group);
}

#[test]
fn test_inspection_serializes() {
    let resolver = resolver();
    let env = Environment::default();
    let inspection = parse_query(&env, "age > 18 AND group = testers", Some(&resolver))
        .unwrap()
        .inspect();

    assert_eq!(
        serde_json::to_value(&inspection).unwrap(),
        serde_json::json!({
            "attributes": ["group"],
            "schemes": [],
            "fields": [{"key": "age", "name": "Age"}],
            "groups": [{"uuid": "cf51cf8d-94da-447a-b27e-a42a900c37a6", "name": "Testers"}],
            "allow_as_group": false
        })
    );
}

// ==================== Thread Safety Tests ====================

#[test]
fn test_parsed_query_is_send_and_sync() {
    assert_send_sync::<ContactQuery<'static>>();
    assert_send_sync::<Inspection>();

    let resolver = resolver();
    let env = Environment::default();
    let query = parse_query(&env, "age > 18 OR group = testers", Some(&resolver)).unwrap();

    std::thread::scope(|s| {
        let printed = s.spawn(|| query.to_string());
        let inspected = s.spawn(|| query.inspect());
        assert_eq!(printed.join().unwrap(), r#"age > 18 OR group = "Testers""#);
        assert_eq!(inspected.join().unwrap().fields.len(), 1);
    });
}
