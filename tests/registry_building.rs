//! Integration tests for building environment and variable registries.

use envar_registry::core::DefinitionKind;
use envar_registry::error::RegistryError;
use envar_registry::prelude::*;
use proptest::prelude::*;

struct SecretStore;

fn environments() -> EnvironmentRegistry {
    EnvironmentRegistry::new()
        .add_env("env1", define_type::<()>(), |env| {
            env.add_resolution("hardcoded", define_type::<String>(), |i| i.payload.to_string())
        })
        .unwrap()
        .add_env("env2", define_type::<SecretStore>(), |env| {
            env.add_resolution("hardcoded", define_type::<String>(), |i| i.payload.to_string())?
                .add_async_resolution("vault", define_type::<Option<String>>(), |i| async move {
                    (*i.payload).clone().unwrap_or(i.variable_name)
                })
        })
        .unwrap()
}

#[test]
fn test_environment_metadata() {
    let environments = environments();
    let env2 = environments.environment("env2").unwrap();

    assert_eq!(environments.environment_names().collect::<Vec<_>>(), ["env1", "env2"]);
    assert!(env2.data_type_name().ends_with("SecretStore"));
    assert_eq!(env2.tags().collect::<Vec<_>>(), ["hardcoded", "vault"]);

    let vault = env2.resolution("vault").unwrap();
    assert_eq!(vault.status(), AsyncStatus::Async);
    assert!(vault.payload_optional());
    assert!(!env2.resolution("hardcoded").unwrap().payload_optional());
}

#[test]
fn test_list_variables_insertion_order() {
    let registry = environments()
        .create_variable_registry()
        .add_var("VAR1", |v| v.for_env("env1", "hardcoded", "v1".to_string()))
        .unwrap()
        .add_var("VAR2", |v| v.dynamic_for("env1", "var2"))
        .unwrap()
        .add_var("VAR3", |v| {
            v.for_env("env1", "hardcoded", "v3-1".to_string())?
                .for_env("env2", "hardcoded", "v3-2".to_string())
        })
        .unwrap();

    assert_eq!(registry.list_variables("env1", "hardcoded").unwrap(), ["VAR1", "VAR3"]);
    assert_eq!(registry.list_variables("env2", "hardcoded").unwrap(), ["VAR3"]);
    assert!(registry.list_variables("env2", "vault").unwrap().is_empty());
    assert_eq!(registry.dynamic_names("env1").into_iter().collect::<Vec<_>>(), ["var2"]);
}

#[test]
fn test_variable_definitions_are_inspectable() {
    let registry = environments()
        .create_variable_registry()
        .add_var("TOKEN", |v| {
            v.dynamic_for("env1", "token")?
                .for_env_without_payload("env2", "vault")
        })
        .unwrap();

    let token = registry.variable("TOKEN").unwrap();
    assert_eq!(
        token.definition("env1").map(|d| d.kind().clone()),
        Some(DefinitionKind::Dynamic {
            dynamic_name: "token".to_string()
        })
    );
    assert_eq!(token.definition("env2").and_then(|d| d.tag()), Some("vault"));
}

#[test]
fn test_builders_do_not_mutate_receiver() {
    let environments = environments();
    let base = environments.create_variable_registry();
    let with_a = base
        .add_var("A", |v| v.for_env("env1", "hardcoded", "a".to_string()))
        .unwrap();
    let with_b = base
        .add_var("B", |v| v.for_env("env1", "hardcoded", "b".to_string()))
        .unwrap();

    assert!(base.is_empty());
    assert_eq!(with_a.variable_names().collect::<Vec<_>>(), ["A"]);
    assert_eq!(with_b.variable_names().collect::<Vec<_>>(), ["B"]);

    let merged = with_a.merge_with(&with_b).unwrap();
    assert_eq!(merged.variable_names().collect::<Vec<_>>(), ["A", "B"]);
    assert_eq!(with_a.len(), 1);

    let extended = environments.add_env("env3", define_type::<()>(), Ok).unwrap();
    assert_eq!(environments.len(), 2);
    assert_eq!(extended.len(), 3);
}

#[test]
fn test_registry_from_other_environments_cannot_merge() {
    let left = environments().create_variable_registry();
    let extended = left.environments().add_env("env3", define_type::<()>(), Ok).unwrap();
    let right = extended.create_variable_registry();

    assert!(matches!(left.merge_with(&right), Err(RegistryError::RegistryMismatch)));
}

#[test]
fn test_configuration_errors_are_flagged() {
    let registry = environments().create_variable_registry();

    let err = registry
        .add_var("A", |v| v.for_env("env9", "hardcoded", "x".to_string()))
        .unwrap_err();
    assert!(err.is_configuration_error());
    assert_eq!(err.to_string(), "Unknown environment 'env9'");

    let err = registry
        .add_var("A", |v| v.for_env_without_payload("env1", "hardcoded"))
        .unwrap_err();
    assert!(matches!(err, RegistryError::MissingPayload { .. }));
}

#[test]
fn test_resolver_data_type_checked() {
    let registry = environments().create_variable_registry();

    assert!(matches!(
        registry.create_resolver("env2", ()),
        Err(RegistryError::EnvironmentDataMismatch { ref env, .. }) if env == "env2"
    ));
    assert!(registry.create_resolver("env2", SecretStore).is_ok());
}

proptest! {
    #[test]
    fn test_duplicate_variable_never_added(names in prop::collection::vec("[A-Z][A-Z0-9_]{0,6}", 1..12)) {
        let mut registry = environments().create_variable_registry();
        let mut seen = std::collections::BTreeSet::new();

        for name in &names {
            let before = registry.len();
            let result = registry.add_var(name.as_str(), Ok);
            if seen.insert(name.clone()) {
                registry = result.unwrap();
                prop_assert_eq!(registry.len(), before + 1);
            } else {
                let is_duplicate = matches!(result, Err(RegistryError::DuplicateVariableName(_)));
                prop_assert!(is_duplicate);
                prop_assert_eq!(registry.len(), before);
            }
        }

        prop_assert_eq!(registry.len(), seen.len());
    }

    #[test]
    fn test_duplicate_environment_never_added(names in prop::collection::vec("[a-z]{1,4}", 1..8)) {
        let mut registry = EnvironmentRegistry::new();
        let mut seen = std::collections::BTreeSet::new();

        for name in &names {
            let result = registry.add_env(name.as_str(), define_type::<()>(), Ok);
            if seen.insert(name.clone()) {
                registry = result.unwrap();
            } else {
                let is_duplicate = matches!(result, Err(RegistryError::DuplicateEnvironment(_)));
                prop_assert!(is_duplicate);
            }
        }

        prop_assert_eq!(registry.len(), seen.len());
    }

    #[test]
    fn test_list_variables_matches_bindings(bindings in prop::collection::vec(0u8..3, 1..16)) {
        // 0: hardcoded in env1, 1: dynamic in env1, 2: unbound in env1
        let mut registry = environments().create_variable_registry();
        let mut expected = Vec::new();

        for (i, binding) in bindings.iter().enumerate() {
            let name = format!("VAR{}", i);
            registry = match binding {
                0 => {
                    expected.push(name.clone());
                    registry.add_var(name.as_str(), |v| v.for_env("env1", "hardcoded", String::new()))
                }
                1 => registry.add_var(name.as_str(), |v| v.dynamic_for("env1", format!("d{}", i))),
                _ => registry.add_var(name.as_str(), |v| v.for_env("env2", "hardcoded", String::new())),
            }
            .unwrap();
        }

        let listed = registry.list_variables("env1", "hardcoded").unwrap();
        prop_assert_eq!(listed, expected.iter().map(String::as_str).collect::<Vec<_>>());
    }
}
