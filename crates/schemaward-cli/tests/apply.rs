//! Manifest application against an in-memory schema service.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use schemaward_core::{PolicyKind, RemovalOrder};
use schemaward_remote::client::Result;
use schemaward_remote::wire::{RemoteAuthorizer, RemoteConstraint, RemoteIndex};
use schemaward_remote::{
    CollectionUpdate, ControllerSettings, Credential, SchemaAggregate, SchemaClient,
    SchemaTransport,
};

use schemaward_cli::apply::{self, ApplySummary, Controllers};
use schemaward_cli::error::CliError;
use schemaward_cli::manifest::Manifest;

#[derive(Default)]
struct InMemorySchema {
    state: Mutex<SchemaAggregate>,
    writes: Mutex<Vec<PolicyKind>>,
}

#[async_trait]
impl SchemaTransport for InMemorySchema {
    async fn fetch_schema(&self, _credential: &Credential) -> Result<SchemaAggregate> {
        Ok(self.state.lock().unwrap().clone())
    }

    async fn replace_collection(
        &self,
        _credential: &Credential,
        update: &CollectionUpdate,
    ) -> Result<()> {
        self.writes.lock().unwrap().push(update.kind());
        update.clone().apply_to(&mut self.state.lock().unwrap());
        Ok(())
    }
}

fn setup(state: SchemaAggregate) -> (Arc<InMemorySchema>, Controllers) {
    let schema = Arc::new(InMemorySchema {
        state: Mutex::new(state),
        ..Default::default()
    });
    let client = SchemaClient::new(schema.clone(), Credential::new("t"));
    let settings = ControllerSettings {
        removal: RemovalOrder::Stable,
        ..Default::default()
    };
    (schema, Controllers::new(client, settings))
}

const MANIFEST: &str = r#"
    [[index]]
    name = "users_by_email"
    gtype = "user"
    expression = "has(this.attributes.email)"
    target_docs = true
    target_connections = false

    [[index]]
    name = "follows"
    gtype = "follows"
    expression = "true"
    target_docs = false
    target_connections = true

    [[authorizer]]
    name = "admins_only"
    method = "/api.DatabaseService/SetIndexes"
    expression = "this.user.attributes.roles.exists(r, r == 'admin')"
    target_requests = true
    target_responses = false
"#;

fn remote_index(name: &str) -> RemoteIndex {
    RemoteIndex {
        name: name.to_string(),
        gtype: "legacy".to_string(),
        expression: "false".to_string(),
        docs: true,
        connections: true,
    }
}

#[tokio::test]
async fn apply_creates_every_declared_entry() {
    let (schema, controllers) = setup(SchemaAggregate::default());
    let manifest = Manifest::parse(MANIFEST).unwrap();

    let summary = apply::apply_manifest(&controllers, &manifest, false)
        .await
        .unwrap();

    assert_eq!(
        summary,
        ApplySummary {
            applied: 3,
            pruned: 0
        }
    );
    let state = schema.state.lock().unwrap().clone();
    assert_eq!(state.indexes.len(), 2);
    assert!(!state.indexes[1].docs);
    assert!(state.indexes[1].connections);
    assert_eq!(state.authorizers[0].method, "/api.DatabaseService/SetIndexes");
    assert_eq!(
        *schema.writes.lock().unwrap(),
        vec![PolicyKind::Index, PolicyKind::Index, PolicyKind::Authorizer]
    );
}

#[tokio::test]
async fn reapply_is_stable() {
    let (schema, controllers) = setup(SchemaAggregate::default());
    let manifest = Manifest::parse(MANIFEST).unwrap();

    apply::apply_manifest(&controllers, &manifest, false)
        .await
        .unwrap();
    let first = schema.state.lock().unwrap().clone();
    apply::apply_manifest(&controllers, &manifest, false)
        .await
        .unwrap();

    assert_eq!(*schema.state.lock().unwrap(), first);
}

#[tokio::test]
async fn prune_only_touches_declared_kinds() {
    let (schema, controllers) = setup(SchemaAggregate {
        indexes: vec![remote_index("orphan"), remote_index("users_by_email")],
        constraints: vec![RemoteConstraint {
            name: "untracked".to_string(),
            gtype: "user".to_string(),
            expression: "true".to_string(),
            target_docs: true,
            target_connections: false,
        }],
        ..Default::default()
    });
    let manifest = Manifest::parse(MANIFEST).unwrap();

    let summary = apply::apply_manifest(&controllers, &manifest, true)
        .await
        .unwrap();

    assert_eq!(summary.pruned, 1);
    let state = schema.state.lock().unwrap().clone();
    let names: Vec<&str> = state.indexes.iter().map(|i| i.name.as_str()).collect();
    assert_eq!(names, vec!["users_by_email", "follows"]);
    assert_eq!(state.indexes[0].gtype, "user");
    assert_eq!(state.constraints.len(), 1);
}

#[tokio::test]
async fn single_entry_commands() {
    let (schema, controllers) = setup(SchemaAggregate {
        authorizers: vec![RemoteAuthorizer {
            name: "admins_only".to_string(),
            method: "/api.DatabaseService/Me".to_string(),
            expression: "true".to_string(),
            target_requests: true,
            target_responses: true,
        }],
        ..Default::default()
    });

    let entry = apply::get(&controllers, PolicyKind::Authorizer, "admins_only")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(entry["target_responses"], true);
    assert!(apply::get(&controllers, PolicyKind::Index, "admins_only")
        .await
        .unwrap()
        .is_none());

    let imported = apply::import(&controllers, PolicyKind::Authorizer, "admins_only")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(imported.authorizers.len(), 1);
    assert!(imported.to_toml().unwrap().contains("[[authorizer]]"));

    let listed = apply::list(&controllers, PolicyKind::Authorizer).await.unwrap();
    assert_eq!(listed.as_array().map(Vec::len), Some(1));

    assert!(apply::exists(&controllers, PolicyKind::Authorizer, "admins_only")
        .await
        .unwrap());
    assert!(apply::delete(&controllers, PolicyKind::Authorizer, "admins_only")
        .await
        .unwrap());
    assert!(!apply::delete(&controllers, PolicyKind::Authorizer, "admins_only")
        .await
        .unwrap());
    assert!(!apply::exists(&controllers, PolicyKind::Authorizer, "admins_only")
        .await
        .unwrap());
    assert_eq!(schema.writes.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn invalid_manifest_writes_nothing() {
    let (schema, controllers) = setup(SchemaAggregate::default());
    let mut manifest = Manifest::parse(MANIFEST).unwrap();
    manifest.indexes[1].expression = String::new();

    assert!(apply::apply_manifest(&controllers, &manifest, false)
        .await
        .is_err());
    assert!(schema.writes.lock().unwrap().is_empty());
}

#[tokio::test]
async fn import_of_incomplete_remote_entry_is_reported() {
    let (schema, controllers) = setup(SchemaAggregate {
        indexes: vec![RemoteIndex {
            name: "half_written".to_string(),
            expression: "true".to_string(),
            docs: true,
            ..Default::default()
        }],
        ..Default::default()
    });

    let err = apply::import(&controllers, PolicyKind::Index, "half_written")
        .await
        .unwrap_err();
    match err {
        CliError::Incomplete { kind, name, reason } => {
            assert_eq!(kind, PolicyKind::Index);
            assert_eq!(name, "half_written");
            assert!(reason.contains("gtype"));
        }
        other => panic!("expected Incomplete, got {other:?}"),
    }

    let entry = apply::get(&controllers, PolicyKind::Index, "half_written")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(entry["gtype"], "");
    assert!(schema.writes.lock().unwrap().is_empty());
}

#[test]
fn kinds_are_described() {
    let kinds = apply::kinds();
    let kinds = kinds.as_array().unwrap();

    assert_eq!(kinds.len(), PolicyKind::ALL.len());
    assert_eq!(kinds[0]["kind"], "index");
    assert_eq!(kinds[0]["collection"], "indexes");
    assert!(kinds[0]["description"]
        .as_str()
        .unwrap()
        .contains("fast lookups"));
    assert!(kinds[3]["description"]
        .as_str()
        .unwrap()
        .contains("inbound requests"));
}
