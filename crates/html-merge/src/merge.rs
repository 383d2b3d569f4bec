/*
 * merge.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! The merge entry point.
//!
//! A merge runs these passes over a template:
//!
//! 1. expand `{?:[key]}` shorthands
//! 2. extract conditional blocks; with none, go straight to substitution
//! 3. pre-render every `key[]` block whose `key` holds a sequence, binding
//!    the rendered text to `key[]` in a working copy of the variables
//! 4. filter conditionals against the working copy
//! 5. substitute the working copy into the filtered text

use futures::FutureExt;
use futures::future::BoxFuture;

use crate::array::{Collection, render_collection};
use crate::conditional::{
    ARRAY_SUFFIX, expand_array_shorthand, extract_conditionals, filter_conditionals,
};
use crate::substitute::substitute;
use crate::value::{Value, Variables};

/// Merge `variables` into the template `raw`.
///
/// `spacer` is placed around selected conditional branches and between
/// elements rendered for array blocks. The caller's mapping is never
/// modified.
pub fn merge<'a>(raw: &'a str, variables: &'a Variables, spacer: &'a str) -> BoxFuture<'a, String> {
    async move {
        let raw = expand_array_shorthand(raw);
        let blocks = extract_conditionals(&raw, variables, spacer);
        if blocks.is_empty() {
            return substitute(&raw, variables).await;
        }
        tracing::trace!(blocks = blocks.len(), "conditional blocks found");

        let mut vars = variables.clone();
        for (key, block) in &blocks {
            let Some(data_key) = key.strip_suffix(ARRAY_SUFFIX) else {
                continue;
            };

            let collection = vars
                .get(data_key)
                .and_then(Value::as_array)
                .map(|items| Collection::from_json_array(items));

            match collection {
                Some(collection) => {
                    let rendered =
                        render_collection(&block.alt_content, &collection, &vars, spacer).await;
                    vars.insert(key.clone(), rendered);
                }
                // Binds the block's own `{key[]}` marker, which then survives
                // substitution verbatim.
                None => vars.insert(key.clone(), block.content.clone()),
            }
        }

        let filtered = filter_conditionals(&raw, &vars, spacer);
        substitute(&filtered, &vars).await
    }
    .boxed()
}

/// Run [`merge`] to completion on the current thread.
pub fn merge_blocking(raw: &str, variables: &Variables, spacer: &str) -> String {
    pollster::block_on(merge(raw, variables, spacer))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_no_markers_unchanged() {
        let vars = Variables::new().with("a", "b");
        for raw in ["", "plain text", "<p class=\"x\">ok</p>"] {
            assert_eq!(merge_blocking(raw, &vars, "-"), raw);
        }
    }

    #[test]
    fn test_hello_world() {
        let vars = Variables::new().with("name", "World");
        assert_eq!(merge_blocking("Hello {name}!", &vars, ""), "Hello World!");
    }

    #[test]
    fn test_conditional_else() {
        let raw = "{?:flag}Yes{:else:}No{:?}";
        assert_eq!(merge_blocking(raw, &Variables::new(), ""), "No");
        assert_eq!(
            merge_blocking(raw, &Variables::new().with("flag", true), ""),
            "Yes"
        );
    }

    #[test]
    fn test_conditional_content_is_substituted() {
        let vars = Variables::new().with("user", "Ann");
        assert_eq!(
            merge_blocking("{?:user}Hi {user}{:else:}Sign in{:?}.", &vars, ""),
            "Hi Ann."
        );
    }

    #[test]
    fn test_conditional_spacer() {
        let vars = Variables::new().with("a", 1);
        assert_eq!(merge_blocking("[{?:a}x{:?}]", &vars, "-"), "[-x-]");
    }

    #[test]
    fn test_array_shorthand() {
        let vars = Variables::new().with("menu", json!([{ "name": "A" }, { "name": "B" }]));
        assert_eq!(
            merge_blocking(
                "<ul>{?:[menu]}<li>{_meta.index}:{name}</li>{:?}</ul>",
                &vars,
                ""
            ),
            "<ul><li>0:A</li><li>1:B</li></ul>"
        );
    }

    #[test]
    fn test_array_long_form() {
        let vars = Variables::new().with("menu", json!([{ "name": "A" }]));
        assert_eq!(
            merge_blocking("{?:menu[]}{menu[]}{:else:}<b>{name}</b>{:?}", &vars, ""),
            "<b>A</b>"
        );
    }

    #[test]
    fn test_array_uses_globals() {
        let vars = Variables::new()
            .with("currency", "$")
            .with("menu", json!([{ "price": 10 }, { "price": 12 }]));
        assert_eq!(
            merge_blocking("{?:[menu]}{currency}{price};{:?}", &vars, ""),
            "$10;$12;"
        );
    }

    #[test]
    fn test_empty_array_renders_nothing() {
        let vars = Variables::new().with("menu", json!([]));
        assert_eq!(
            merge_blocking("<ul>{?:[menu]}<li>{name}</li>{:?}</ul>", &vars, ""),
            "<ul></ul>"
        );
    }

    #[test]
    fn test_missing_array_leaves_marker() {
        let raw = "<ul>{?:[menu]}<li>{name}</li>{:?}</ul>";
        assert_eq!(merge_blocking(raw, &Variables::new(), ""), "<ul>{menu[]}</ul>");

        // Keyed objects are not rendered through a template's array block.
        let keyed = Variables::new().with("menu", json!({ "a": { "name": "A" } }));
        assert_eq!(merge_blocking(raw, &keyed, ""), "<ul>{menu[]}</ul>");
    }

    #[test]
    fn test_caller_variables_untouched() {
        let vars = Variables::new().with("menu", json!([{ "name": "A" }]));
        merge_blocking("{?:[menu]}{name}{:?}", &vars, "");
        assert_eq!(vars.len(), 1);
        assert!(!vars.contains_key("menu[]"));
    }

    #[test]
    fn test_sync_and_async_values_agree() {
        let raw = "Hello {name}, {?:vip}VIP {[name]}{:?}{?:[orders]}#{id} {:?}";
        let orders = json!([{ "id": 1 }, { "id": 2 }]);

        let sync_vars = Variables::new()
            .with("name", Value::sync(|_| "Ann".to_string()))
            .with("vip", true)
            .with("orders", orders.clone());
        let async_vars = Variables::new()
            .with("name", Value::callback(|_, done| done.complete("Ann")))
            .with("vip", true)
            .with("orders", orders);

        let expected = "Hello Ann, VIP \"Ann\"#1 #2 ";
        assert_eq!(merge_blocking(raw, &sync_vars, ""), expected);
        assert_eq!(merge_blocking(raw, &async_vars, ""), expected);
    }
}
