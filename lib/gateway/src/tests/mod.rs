use serde_json::json;

use crate::config::{GatewayOptions, UnmatchedEntityPolicy};
use crate::execution_request::ExecutionRequest;
use crate::execution_result::ExecutionResult;
use crate::extend::{ArgumentMapping, Extend};
use crate::schema::visitor::transform;
use crate::schema::{FieldDefinition, ObjectType, Subgraph, SubgraphSchema};
use crate::value::InputValue;
use crate::Gateway;

use fixtures::{journal_entries, RecordingExecutor};


fn stores_schema() -> SubgraphSchema {
    SubgraphSchema::new()
        .with_query_type(
            ObjectType::new("Query")
                .with_field(
                    FieldDefinition::new("store", "Store").with_argument("id", "Int"),
                )
                .with_field(
                    FieldDefinition::list("bookSells", "Sale").with_argument("storeId", "Int"),
                ),
        )
        .with_type(
            ObjectType::new("Store")
                .with_field(FieldDefinition::new("id", "Int"))
                .with_field(FieldDefinition::new("name", "String")),
        )
        .with_type(
            ObjectType::new("Sale")
                .with_field(FieldDefinition::new("id", "Int"))
                .with_field(FieldDefinition::new("count", "Int")),
        )
}

#[tokio::test]
async fn root_passthrough() {
    let (executor, journal) = RecordingExecutor::new(|request| {
        assert_eq!(request.query, "{ f0: hello }");
        ExecutionResult::ok(json!({"f0": "world"}))
    });
    let schema = SubgraphSchema::new().with_query_type(
        ObjectType::new("Query").with_field(FieldDefinition::new("hello", "String")),
    );
    let gateway = Gateway::build(
        vec![Subgraph::new("a", schema, executor)],
        vec![],
        GatewayOptions::default(),
    )
    .unwrap();

    let result = gateway.execute(ExecutionRequest::from_query("{ hello }")).await;

    assert_eq!(
        serde_json::to_value(&result).unwrap(),
        json!({"data": {"hello": "world"}})
    );
    assert_eq!(journal_entries(&journal), ["{ f0: hello }"]);
}

#[tokio::test]
async fn sibling_root_fields_batch_into_one_document() {
    let (executor, journal) = RecordingExecutor::with_data(json!({"f0": "hi", "f1": "earth"}));
    let schema = SubgraphSchema::new().with_query_type(
        ObjectType::new("Query")
            .with_field(FieldDefinition::new("hello", "String"))
            .with_field(FieldDefinition::new("world", "String")),
    );
    let gateway = Gateway::build(
        vec![Subgraph::new("a", schema, executor)],
        vec![],
        GatewayOptions::default(),
    )
    .unwrap();

    let result = gateway
        .execute(ExecutionRequest::from_query("{ hello world }"))
        .await;

    assert_eq!(
        serde_json::to_value(&result).unwrap(),
        json!({"data": {"hello": "hi", "world": "earth"}})
    );
    // Both siblings went out as one aliased document.
    assert_eq!(journal_entries(&journal), ["{ f0: hello f1: world }"]);
}

#[tokio::test]
async fn subgraph_errors_abort_the_request() {
    let (executor, _journal) =
        RecordingExecutor::new(|_| ExecutionResult::from_error_message("boom"));
    let schema = SubgraphSchema::new().with_query_type(
        ObjectType::new("Query").with_field(FieldDefinition::new("hello", "String")),
    );
    let gateway = Gateway::build(
        vec![Subgraph::new("a", schema, executor)],
        vec![],
        GatewayOptions::default(),
    )
    .unwrap();

    let result = gateway.execute(ExecutionRequest::from_query("{ hello }")).await;

    assert_eq!(result.data, serde_json::Value::Null);
    let errors = result.errors.unwrap();
    assert_eq!(errors[0].message, "boom");
    let extensions = errors[0].extensions.as_ref().unwrap();
    assert_eq!(extensions["code"], json!("DOWNSTREAM_SERVICE_ERROR"));
    assert_eq!(extensions["serviceName"], json!("a"));
}

#[tokio::test]
async fn cross_graph_extension_captures_parent_arguments() {
    let (executor, journal) = RecordingExecutor::new(|request| {
        if request.query.contains("store(") {
            ExecutionResult::ok(json!({"f0": {"id": 1}}))
        } else {
            ExecutionResult::ok(json!({"f0": [{"id": 10}, {"id": 11}]}))
        }
    });
    let gateway = Gateway::build(
        vec![Subgraph::new("stores", stores_schema(), executor)],
        vec![transform::extend(
            "Store",
            FieldDefinition::list("bookSells", "Sale"),
            Extend::new("stores", "bookSells")
                .with_argument_mapping(ArgumentMapping::renamed("id", "storeId")),
        )],
        GatewayOptions::default(),
    )
    .unwrap();

    let result = gateway
        .execute(ExecutionRequest::from_query(
            "{ store(id: 1) { bookSells { id } } }",
        ))
        .await;

    assert_eq!(
        serde_json::to_value(&result).unwrap(),
        json!({"data": {"store": {"bookSells": [{"id": 10}, {"id": 11}]}}})
    );
    assert_eq!(
        journal_entries(&journal),
        [
            "{ f0: store(id: 1) { id } }",
            "{ f0: bookSells(storeId: 1) { id } }"
        ]
    );
}

fn books_schema() -> SubgraphSchema {
    SubgraphSchema::new()
        .with_query_type(
            ObjectType::new("Query").with_field(FieldDefinition::list("books", "Book")),
        )
        .with_type(
            ObjectType::new("Book")
                .with_field(FieldDefinition::new("title", "String"))
                .with_field(FieldDefinition::new("authorId", "Int")),
        )
}

fn authors_schema() -> SubgraphSchema {
    SubgraphSchema::new()
        .with_query_type(
            ObjectType::new("Query")
                .with_field(FieldDefinition::list("authors", "Author").with_argument("ids", "[Int]")),
        )
        .with_type(
            ObjectType::new("Author")
                .with_field(FieldDefinition::new("id", "Int"))
                .with_field(FieldDefinition::new("name", "String")),
        )
}

fn author_extend() -> Extend {
    Extend::new("authors", "authors")
        .with_argument_mapping(ArgumentMapping::new("authorId", |value| {
            ("ids".to_string(), InputValue::List(vec![value]))
        }))
        .with_additional_fields(vec!["id".to_string()])
        .with_batch_filter(|parent, candidate| parent.get("authorId") == candidate.get("id"))
}

fn books_gateway(
    books_response: serde_json::Value,
    authors_response: serde_json::Value,
    options: GatewayOptions,
) -> (Gateway, fixtures::Journal, fixtures::Journal) {
    let (books_executor, books_journal) = RecordingExecutor::with_data(books_response);
    let (authors_executor, authors_journal) = RecordingExecutor::with_data(authors_response);
    let gateway = Gateway::build(
        vec![
            Subgraph::new("books", books_schema(), books_executor),
            Subgraph::new("authors", authors_schema(), authors_executor)
                .with_expose_at_root(false),
        ],
        vec![transform::extend(
            "Book",
            FieldDefinition::new("author", "Author"),
            author_extend(),
        )],
        options,
    )
    .unwrap();
    (gateway, books_journal, authors_journal)
}

#[tokio::test]
async fn entity_fetch_batches_and_filters_per_parent() {
    let (gateway, books_journal, authors_journal) = books_gateway(
        json!({"f0": [
            {"title": "b1", "authorId": 1},
            {"title": "b2", "authorId": 2},
            {"title": "b3", "authorId": 3}
        ]}),
        json!({"f0": [
            {"name": "A1", "id": 1},
            {"name": "A2", "id": 2},
            {"name": "A3", "id": 3}
        ]}),
        GatewayOptions::default(),
    );

    let result = gateway
        .execute(ExecutionRequest::from_query(
            "{ books { title author { name } } }",
        ))
        .await;

    assert_eq!(
        serde_json::to_value(&result).unwrap(),
        json!({"data": {"books": [
            {"title": "b1", "author": {"name": "A1"}},
            {"title": "b2", "author": {"name": "A2"}},
            {"title": "b3", "author": {"name": "A3"}}
        ]}})
    );
    assert_eq!(journal_entries(&books_journal), ["{ f0: books { title authorId } }"]);
    // One coalesced call for all three parents.
    assert_eq!(
        journal_entries(&authors_journal),
        ["{ f0: authors(ids: [1, 2, 3]) { name id } }"]
    );
}

#[tokio::test]
async fn equal_entity_fetches_share_one_dispatch() {
    let (gateway, _books_journal, authors_journal) = books_gateway(
        json!({"f0": [
            {"title": "b1", "authorId": 1},
            {"title": "b2", "authorId": 1}
        ]}),
        json!({"f0": [{"name": "A1", "id": 1}]}),
        GatewayOptions::default(),
    );

    let result = gateway
        .execute(ExecutionRequest::from_query(
            "{ books { title author { name } } }",
        ))
        .await;

    assert_eq!(
        serde_json::to_value(&result).unwrap(),
        json!({"data": {"books": [
            {"title": "b1", "author": {"name": "A1"}},
            {"title": "b2", "author": {"name": "A1"}}
        ]}})
    );
    assert_eq!(
        journal_entries(&authors_journal),
        ["{ f0: authors(ids: [1]) { name id } }"]
    );
}

#[tokio::test]
async fn unmatched_entity_resolves_to_null_by_default() {
    let (gateway, _books_journal, _authors_journal) = books_gateway(
        json!({"f0": [{"title": "b1", "authorId": 9}]}),
        json!({"f0": [{"name": "A1", "id": 1}]}),
        GatewayOptions::default(),
    );

    let result = gateway
        .execute(ExecutionRequest::from_query(
            "{ books { title author { name } } }",
        ))
        .await;

    assert_eq!(
        serde_json::to_value(&result).unwrap(),
        json!({"data": {"books": [{"title": "b1", "author": null}]}})
    );
}

#[tokio::test]
async fn unmatched_entity_fails_when_configured() {
    let options = GatewayOptions {
        unmatched_entity_policy: UnmatchedEntityPolicy::Fail,
        ..GatewayOptions::default()
    };
    let (gateway, _books_journal, _authors_journal) = books_gateway(
        json!({"f0": [{"title": "b1", "authorId": 9}]}),
        json!({"f0": [{"name": "A1", "id": 1}]}),
        options,
    );

    let result = gateway
        .execute(ExecutionRequest::from_query(
            "{ books { title author { name } } }",
        ))
        .await;

    assert_eq!(result.data, serde_json::Value::Null);
    let errors = result.errors.unwrap();
    assert_eq!(errors.len(), 1);
    assert_eq!(
        errors[0].message,
        "no authors entity matched the parent of field author"
    );
}

#[tokio::test]
async fn missing_subgraph_fails_the_request() {
    let (executor, _journal) =
        RecordingExecutor::with_data(json!({"f0": {"id": 1}}));
    let schema = SubgraphSchema::new()
        .with_query_type(
            ObjectType::new("Query").with_field(FieldDefinition::new("thing", "Thing")),
        )
        .with_type(ObjectType::new("Thing").with_field(FieldDefinition::new("id", "Int")));
    let gateway = Gateway::build(
        vec![Subgraph::new("things", schema, executor)],
        vec![transform::extend(
            "Thing",
            FieldDefinition::new("other", "Other"),
            Extend::new("missing", "other"),
        )],
        GatewayOptions::default(),
    )
    .unwrap();

    let result = gateway
        .execute(ExecutionRequest::from_query("{ thing { other } }"))
        .await;

    assert_eq!(result.data, serde_json::Value::Null);
    let errors = result.errors.unwrap();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].message, "Subgraph missing not found");
}

#[tokio::test]
async fn introspection_bypasses_the_subgraphs() {
    let (executor, journal) = RecordingExecutor::with_data(json!({}));
    let gateway = Gateway::build(
        vec![Subgraph::new("stores", stores_schema(), executor)],
        vec![],
        GatewayOptions::default(),
    )
    .unwrap();

    let result = gateway
        .execute(ExecutionRequest::from_query(
            "{ __schema { types { name } } }",
        ))
        .await;

    let data = serde_json::to_value(&result).unwrap();
    let type_names: Vec<&str> = data["data"]["__schema"]["types"]
        .as_array()
        .unwrap()
        .iter()
        .map(|entry| entry["name"].as_str().unwrap())
        .collect();
    assert!(type_names.contains(&"Query"));
    assert!(type_names.contains(&"Store"));
    assert!(journal_entries(&journal).is_empty());
}

#[tokio::test]
async fn introspection_can_be_disabled() {
    let (executor, _journal) = RecordingExecutor::with_data(json!({}));
    let gateway = Gateway::build(
        vec![Subgraph::new("stores", stores_schema(), executor)],
        vec![],
        GatewayOptions {
            expose_introspection: false,
            ..GatewayOptions::default()
        },
    )
    .unwrap();

    let result = gateway
        .execute(ExecutionRequest::from_query("{ __schema { types { name } } }"))
        .await;

    assert_eq!(result.errors.unwrap()[0].message, "Introspection is disabled");
}

#[tokio::test]
async fn mutation_siblings_run_sequentially() {
    let counter = std::sync::Arc::new(std::sync::Mutex::new(0));
    let respond_counter = counter.clone();
    let (executor, journal) = RecordingExecutor::new(move |_| {
        let mut counter = respond_counter.lock().unwrap();
        *counter += 1;
        ExecutionResult::ok(json!({"f0": *counter}))
    });
    let schema = SubgraphSchema::new()
        .with_query_type(
            ObjectType::new("Query").with_field(FieldDefinition::new("count", "Int")),
        )
        .with_mutation_type(
            ObjectType::new("Mutation").with_field(FieldDefinition::new("increment", "Int")),
        );
    let gateway = Gateway::build(
        vec![Subgraph::new("counter", schema, executor)],
        vec![],
        GatewayOptions::default(),
    )
    .unwrap();

    let result = gateway
        .execute(ExecutionRequest::from_query(
            "mutation { a: increment b: increment }",
        ))
        .await;

    // The first increment completed before the second was dispatched.
    assert_eq!(
        serde_json::to_value(&result).unwrap(),
        json!({"data": {"a": 1, "b": 2}})
    );
    assert_eq!(
        journal_entries(&journal),
        ["mutation { f0: increment }", "mutation { f0: increment }"]
    );
}

#[tokio::test]
async fn response_keys_follow_selection_order() {
    let (executor, _journal) = RecordingExecutor::with_data(
        // Subgraph answers in a different field order than the selection.
        json!({"f0": {"id": 1, "name": "s"}}),
    );
    let gateway = Gateway::build(
        vec![Subgraph::new("stores", stores_schema(), executor)],
        vec![],
        GatewayOptions::default(),
    )
    .unwrap();

    let result = gateway
        .execute(ExecutionRequest::from_query("{ store(id: 1) { name id } }"))
        .await;

    assert_eq!(
        serde_json::to_string(&result).unwrap(),
        r#"{"data":{"store":{"name":"s","id":1}}}"#
    );
}

#[tokio::test]
async fn aliases_flow_through_fetch_and_extraction() {
    let (executor, journal) =
        RecordingExecutor::with_data(json!({"f0": {"n": "downtown"}}));
    let gateway = Gateway::build(
        vec![Subgraph::new("stores", stores_schema(), executor)],
        vec![],
        GatewayOptions::default(),
    )
    .unwrap();

    let result = gateway
        .execute(ExecutionRequest::from_query("{ s: store(id: 1) { n: name } }"))
        .await;

    assert_eq!(
        serde_json::to_value(&result).unwrap(),
        json!({"data": {"s": {"n": "downtown"}}})
    );
    assert_eq!(journal_entries(&journal), ["{ f0: store(id: 1) { n: name } }"]);
}

#[tokio::test]
async fn null_valued_argument_mappings_are_dropped() {
    let (things_executor, things_journal) = RecordingExecutor::new(|request| {
        if request.query.contains("parent") {
            ExecutionResult::ok(json!({"f0": {"id": 1}}))
        } else {
            ExecutionResult::ok(json!({"f0": [{"id": 5}]}))
        }
    });
    let schema = SubgraphSchema::new()
        .with_query_type(
            ObjectType::new("Query")
                .with_field(FieldDefinition::new("parent", "Parent"))
                .with_field(FieldDefinition::list("items", "Item").with_argument("key", "Int")),
        )
        .with_type(ObjectType::new("Parent").with_field(FieldDefinition::new("id", "Int")))
        .with_type(ObjectType::new("Item").with_field(FieldDefinition::new("id", "Int")));
    let gateway = Gateway::build(
        vec![Subgraph::new("things", schema, things_executor)],
        vec![transform::extend(
            "Parent",
            FieldDefinition::list("items", "Item"),
            Extend::new("things", "items")
                .with_argument_mapping(ArgumentMapping::renamed("missingKey", "key")),
        )],
        GatewayOptions::default(),
    )
    .unwrap();

    let result = gateway
        .execute(ExecutionRequest::from_query("{ parent { items { id } } }"))
        .await;

    assert_eq!(
        serde_json::to_value(&result).unwrap(),
        json!({"data": {"parent": {"items": [{"id": 5}]}}})
    );
    // The parent had no `missingKey`, so the mapped argument is absent.
    assert_eq!(
        journal_entries(&things_journal),
        ["{ f0: parent { missingKey } }", "{ f0: items { id } }"]
    );
}

#[tokio::test]
async fn variables_substitute_into_fetch_arguments() {
    let (executor, journal) =
        RecordingExecutor::with_data(json!({"f0": {"id": 7}}));
    let gateway = Gateway::build(
        vec![Subgraph::new("stores", stores_schema(), executor)],
        vec![],
        GatewayOptions::default(),
    )
    .unwrap();

    let result = gateway
        .execute(
            ExecutionRequest::from_query("query($id: Int!) { store(id: $id) { id } }")
                .with_variable("id", json!(7)),
        )
        .await;

    assert_eq!(
        serde_json::to_value(&result).unwrap(),
        json!({"data": {"store": {"id": 7}}})
    );
    assert_eq!(journal_entries(&journal), ["{ f0: store(id: 7) { id } }"]);
}

#[tokio::test]
async fn missing_non_null_variable_is_rejected() {
    let (executor, journal) = RecordingExecutor::with_data(json!({}));
    let gateway = Gateway::build(
        vec![Subgraph::new("stores", stores_schema(), executor)],
        vec![],
        GatewayOptions::default(),
    )
    .unwrap();

    let result = gateway
        .execute(ExecutionRequest::from_query(
            "query($id: Int!) { store(id: $id) { id } }",
        ))
        .await;

    assert_eq!(
        result.errors.unwrap()[0].message,
        "Variable \"$id\" of non-null type must be provided"
    );
    assert!(journal_entries(&journal).is_empty());
}

#[tokio::test]
async fn inline_fragments_narrow_by_typename() {
    let (executor, journal) = RecordingExecutor::with_data(json!({"f0": [
        {"__typename": "Store", "name": "downtown"},
        {"__typename": "Sale"}
    ]}));
    let schema = SubgraphSchema::new()
        .with_query_type(
            ObjectType::new("Query").with_field(FieldDefinition::list("search", "Node")),
        )
        .with_type(
            ObjectType::new("Store")
                .with_field(FieldDefinition::new("id", "Int"))
                .with_field(FieldDefinition::new("name", "String")),
        );
    let gateway = Gateway::build(
        vec![Subgraph::new("stores", schema, executor)],
        vec![],
        GatewayOptions::default(),
    )
    .unwrap();

    let result = gateway
        .execute(ExecutionRequest::from_query(
            "{ search { __typename ... on Store { name } } }",
        ))
        .await;

    assert_eq!(
        serde_json::to_value(&result).unwrap(),
        json!({"data": {"search": [
            {"__typename": "Store", "name": "downtown"},
            {"__typename": "Sale"}
        ]}})
    );
    assert_eq!(
        journal_entries(&journal),
        ["{ f0: search { __typename ... on Store { name } } }"]
    );
}

#[tokio::test]
async fn unknown_field_is_rejected_before_any_fetch() {
    let (executor, journal) = RecordingExecutor::with_data(json!({}));
    let gateway = Gateway::build(
        vec![Subgraph::new("stores", stores_schema(), executor)],
        vec![],
        GatewayOptions::default(),
    )
    .unwrap();

    let result = gateway
        .execute(ExecutionRequest::from_query("{ warehouse { id } }"))
        .await;

    assert_eq!(
        result.errors.unwrap()[0].message,
        "Cannot query field \"warehouse\" on type \"Query\""
    );
    assert!(journal_entries(&journal).is_empty());
}
