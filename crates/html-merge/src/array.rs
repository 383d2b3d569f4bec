/*
 * array.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Array rendering.
//!
//! Renders an item template once per element of a [`Collection`] and joins
//! the fragments with a spacer. Each element is merged against:
//!
//! 1. meta variables (`_meta.index`, `_meta.key`, `_meta.indexOddEven`)
//! 2. the global variables
//! 3. the element's own fields
//!
//! Later layers win on key collisions.

use indexmap::IndexMap;

use crate::merge::merge;
use crate::value::Variables;

pub const META_INDEX: &str = "_meta.index";
pub const META_KEY: &str = "_meta.key";
pub const META_INDEX_ODD_EVEN: &str = "_meta.indexOddEven";

/// The elements to render, in iteration order.
#[derive(Debug, Clone)]
pub enum Collection {
    /// `_meta.key` is the stringified index.
    Sequence(Vec<Variables>),
    /// `_meta.key` is the element's key.
    Keyed(IndexMap<String, Variables>),
}

impl Collection {
    /// Interpret a JSON array as a sequence, or a JSON object as a keyed
    /// collection. Elements that are not objects contribute no fields.
    pub fn from_json(json: &serde_json::Value) -> Option<Self> {
        match json {
            serde_json::Value::Array(items) => Some(Self::from_json_array(items)),
            serde_json::Value::Object(map) => Some(Collection::Keyed(
                map.iter()
                    .map(|(key, element)| (key.clone(), element_variables(element)))
                    .collect(),
            )),
            _ => None,
        }
    }

    pub fn from_json_array(items: &[serde_json::Value]) -> Self {
        Collection::Sequence(items.iter().map(element_variables).collect())
    }

    pub fn len(&self) -> usize {
        match self {
            Collection::Sequence(items) => items.len(),
            Collection::Keyed(items) => items.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Elements paired with their `_meta.key`.
    fn entries(&self) -> Vec<(String, &Variables)> {
        match self {
            Collection::Sequence(items) => items
                .iter()
                .enumerate()
                .map(|(index, element)| (index.to_string(), element))
                .collect(),
            Collection::Keyed(items) => items
                .iter()
                .map(|(key, element)| (key.clone(), element))
                .collect(),
        }
    }
}

impl From<Vec<Variables>> for Collection {
    fn from(items: Vec<Variables>) -> Self {
        Collection::Sequence(items)
    }
}

fn element_variables(element: &serde_json::Value) -> Variables {
    match element {
        serde_json::Value::Object(fields) => fields
            .iter()
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect(),
        _ => Variables::new(),
    }
}

/// Meta variables for the element at `index`.
pub fn meta_variables(index: usize, key: &str) -> Variables {
    let parity = if index % 2 == 0 { "Even" } else { "Odd" };
    Variables::new()
        .with(META_INDEX, index)
        .with(META_KEY, key)
        .with(META_INDEX_ODD_EVEN, parity)
}

/// Render `item_template` once per element and join the results with
/// `spacer`.
///
/// Elements are rendered strictly one after another, with a one-turn yield
/// between them. N elements produce exactly N-1 spacers.
pub async fn render_collection(
    item_template: &str,
    collection: &Collection,
    globals: &Variables,
    spacer: &str,
) -> String {
    tracing::debug!(elements = collection.len(), "rendering collection");

    let mut html = String::new();
    for (index, (key, element)) in collection.entries().into_iter().enumerate() {
        let mut scoped = meta_variables(index, &key);
        scoped.extend_from(globals);
        scoped.extend_from(element);

        let fragment = merge(item_template, &scoped, "").await;
        if index > 0 {
            html.push_str(spacer);
        }
        html.push_str(&fragment);

        tokio::task::yield_now().await;
    }
    html
}

/// Render a whole template once per element, with no global variables.
pub async fn render_each(template: &str, collection: &Collection, spacer: &str) -> String {
    render_collection(template, collection, &Variables::new(), spacer).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn render(item: &str, collection: &Collection, globals: &Variables, spacer: &str) -> String {
        pollster::block_on(render_collection(item, collection, globals, spacer))
    }

    #[test]
    fn test_sequence_with_spacer() {
        let collection = Collection::from_json(&json!([{ "name": "A" }, { "name": "B" }])).unwrap();
        assert_eq!(
            render("<li>{_meta.index}:{name}</li>", &collection, &Variables::new(), ","),
            "<li>0:A</li>,<li>1:B</li>"
        );
    }

    #[test]
    fn test_spacer_count() {
        let items: Vec<Variables> = (0..5).map(|_| Variables::new()).collect();
        let out = render("x", &Collection::from(items), &Variables::new(), "|");
        assert_eq!(out, "x|x|x|x|x");
        assert_eq!(out.matches('|').count(), 4);
    }

    #[test]
    fn test_empty_collection() {
        let out = render("x", &Collection::Sequence(vec![]), &Variables::new(), "|");
        assert_eq!(out, "");
    }

    #[test]
    fn test_meta_variables() {
        let collection = Collection::from_json(&json!([{}, {}, {}])).unwrap();
        assert_eq!(
            render(
                "{_meta.key}={_meta.indexOddEven};",
                &collection,
                &Variables::new(),
                ""
            ),
            "0=Even;1=Odd;2=Even;"
        );
    }

    #[test]
    fn test_keyed_collection() {
        let collection = Collection::from_json(&json!({
            "pepperoni": { "price": 12 },
            "margherita": { "price": 10 }
        }))
        .unwrap();
        assert_eq!(
            render("{_meta.index}:{_meta.key}:{price}", &collection, &Variables::new(), " "),
            "0:pepperoni:12 1:margherita:10"
        );
    }

    #[test]
    fn test_element_fields_override_globals() {
        let globals = Variables::new().with("currency", "$").with("name", "global");
        let collection = Collection::from_json(&json!([{ "name": "Hawaiian" }, {}])).unwrap();
        assert_eq!(
            render("{currency}{name}", &collection, &globals, ","),
            "$Hawaiian,$global"
        );
    }

    #[test]
    fn test_item_template_conditionals() {
        let collection =
            Collection::from_json(&json!([{ "name": "A", "special": true }, { "name": "B" }]))
                .unwrap();
        assert_eq!(
            render(
                "{name}{?:special}*{:?}",
                &collection,
                &Variables::new(),
                ","
            ),
            "A*,B"
        );
    }

    #[test]
    fn test_render_each() {
        let collection = Collection::from_json(&json!([{ "n": 1 }, { "n": 2 }])).unwrap();
        assert_eq!(
            pollster::block_on(render_each("<p>{n}</p>", &collection, "\n")),
            "<p>1</p>\n<p>2</p>"
        );
    }

    #[test]
    fn test_non_collection_json() {
        assert!(Collection::from_json(&json!("menu")).is_none());
        let collection = Collection::from_json(&json!(["a", 1])).unwrap();
        assert_eq!(collection.len(), 2);
    }
}
