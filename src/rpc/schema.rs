use std::path::Path;

use anyhow::Context;
use serde_json::{json, Value};

/// Machine-readable description of the endpoint: operations, params and
/// result types. Served on GET /api and written to disk at startup.
pub fn document() -> Value {
    json!({
        "service": "userhub",
        "endpoint": "/api",
        "operations": [
            {
                "name": "users",
                "kind": "query",
                "params": {},
                "result": "[User]"
            },
            {
                "name": "user",
                "kind": "query",
                "params": { "id": "ID" },
                "result": "User | null"
            },
            {
                "name": "login",
                "kind": "mutation",
                "params": { "username": "String", "password": "String" },
                "result": "LoginResponse"
            },
            {
                "name": "createUser",
                "kind": "mutation",
                "params": {
                    "username": "String",
                    "email": "String",
                    "password": "String",
                    "firstName": "String?",
                    "lastName": "String?",
                    "phoneNumber": "String?",
                    "role": "UserRole?"
                },
                "result": "UserResponse"
            },
            {
                "name": "updateUser",
                "kind": "mutation",
                "params": {
                    "id": "ID",
                    "firstName": "String?",
                    "lastName": "String?",
                    "phoneNumber": "String?",
                    "isActive": "Boolean?"
                },
                "result": "UserResponse"
            },
            {
                "name": "deleteUser",
                "kind": "mutation",
                "params": { "id": "ID" },
                "result": "Boolean"
            },
            {
                "name": "testPassword",
                "kind": "query",
                "params": { "password": "String" },
                "result": "Boolean"
            }
        ],
        "types": {
            "UserRole": ["admin", "user", "manager"],
            "User": {
                "id": "ID",
                "username": "String",
                "email": "String",
                "role": "UserRole",
                "isActive": "Boolean",
                "firstName": "String?",
                "lastName": "String?",
                "phoneNumber": "String?",
                "lastLoginAt": "DateTime?",
                "createdAt": "DateTime",
                "updatedAt": "DateTime"
            },
            "UserResponse": { "error": "String?", "user": "User?" },
            "LoginResponse": { "error": "String?", "token": "String?", "user": "User?" }
        }
    })
}

pub fn emit(path: &Path) -> anyhow::Result<()> {
    let doc = serde_json::to_string_pretty(&document())?;
    std::fs::write(path, doc).with_context(|| format!("write schema file {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_names_every_operation() {
        let doc = document();
        let names: Vec<&str> = doc["operations"]
            .as_array()
            .unwrap()
            .iter()
            .map(|op| op["name"].as_str().unwrap())
            .collect();
        assert_eq!(
            names,
            [
                "users",
                "user",
                "login",
                "createUser",
                "updateUser",
                "deleteUser",
                "testPassword"
            ]
        );
    }

    #[test]
    fn user_type_has_no_password_field() {
        let doc = document();
        let user = doc["types"]["User"].as_object().unwrap();
        assert!(!user.keys().any(|k| k.to_lowercase().contains("password")));
    }

    #[test]
    fn role_type_lists_all_variants() {
        let doc = document();
        assert_eq!(
            doc["types"]["UserRole"],
            json!(["admin", "user", "manager"])
        );
    }
}
