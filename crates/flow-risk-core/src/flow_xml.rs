use anyhow::{Context, Result};
use roxmltree::{Document, Node};
use serde_json::{Map, Value};

const ATTRIBUTE_KEY: &str = "$";
const TEXT_KEY: &str = "_";

/// Reshape an XML document into nested JSON objects and arrays.
///
/// The root element is wrapped in a single-key object named after it. Leaf
/// elements without attributes collapse to their trimmed text; everything else
/// becomes an object holding attributes under `$`, text under `_` and one array
/// per child tag, in the order tags first appear.
pub fn xml_to_json(text: &str) -> Result<Value> {
    let doc = Document::parse(text).context("failed to parse flow XML")?;
    let root = doc.root_element();
    let mut wrapper = Map::new();
    wrapper.insert(root.tag_name().name().to_string(), element_to_value(root));
    Ok(Value::Object(wrapper))
}

/// Pretty-print converted XML for inclusion in the prompt.
pub fn to_prompt_json(value: &Value) -> Result<String> {
    serde_json::to_string_pretty(value).context("failed to serialise flow structure")
}

fn element_to_value(node: Node<'_, '_>) -> Value {
    let text = direct_text(node);
    let has_children = node.children().any(|child| child.is_element());
    let has_attributes = node.attributes().next().is_some();

    if !has_children && !has_attributes {
        return Value::String(text);
    }

    let mut object = Map::new();
    if has_attributes {
        let attributes = node
            .attributes()
            .map(|attr| (attr.name().to_string(), Value::String(attr.value().to_string())))
            .collect::<Map<_, _>>();
        object.insert(ATTRIBUTE_KEY.to_string(), Value::Object(attributes));
    }
    if !text.is_empty() {
        object.insert(TEXT_KEY.to_string(), Value::String(text));
    }
    for child in node.children().filter(|child| child.is_element()) {
        let entry = object
            .entry(child.tag_name().name().to_string())
            .or_insert_with(|| Value::Array(Vec::new()));
        if let Value::Array(items) = entry {
            items.push(element_to_value(child));
        }
    }
    Value::Object(object)
}

fn direct_text(node: Node<'_, '_>) -> String {
    node.children()
        .filter(|child| child.is_text())
        .filter_map(|child| child.text())
        .collect::<String>()
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn wraps_root_and_groups_repeated_children() {
        let value = xml_to_json(
            r#"<Flow xmlns="http://soap.sforce.com/2006/04/metadata">
                <apiVersion>59.0</apiVersion>
                <decisions><name>Check</name></decisions>
                <decisions><name>Route</name></decisions>
            </Flow>"#,
        )
        .unwrap();

        assert_eq!(
            value,
            json!({
                "Flow": {
                    "apiVersion": ["59.0"],
                    "decisions": [
                        {"name": ["Check"]},
                        {"name": ["Route"]}
                    ]
                }
            })
        );
    }

    #[test]
    fn keeps_attributes_and_mixed_text() {
        let value = xml_to_json(r#"<root><field type="Id">001xx<!-- c --></field></root>"#).unwrap();
        assert_eq!(
            value,
            json!({"root": {"field": [{"$": {"type": "Id"}, "_": "001xx"}]}})
        );
    }

    #[test]
    fn empty_leaf_becomes_empty_string() {
        let value = xml_to_json("<root><empty/></root>").unwrap();
        assert_eq!(value, json!({"root": {"empty": [""]}}));
    }

    #[test]
    fn preserves_first_appearance_key_order() {
        let value = xml_to_json("<r><zeta>1</zeta><alpha>2</alpha><zeta>3</zeta></r>").unwrap();
        let keys: Vec<_> = value["r"].as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys, vec!["zeta", "alpha"]);
    }

    #[test]
    fn prompt_json_is_indented() {
        let value = xml_to_json("<r><a>1</a></r>").unwrap();
        let text = to_prompt_json(&value).unwrap();
        assert_eq!(text, "{\n  \"r\": {\n    \"a\": [\n      \"1\"\n    ]\n  }\n}");
    }

    #[test]
    fn malformed_xml_is_an_error() {
        let err = xml_to_json("<Flow><open></Flow>").unwrap_err();
        assert!(err.to_string().contains("failed to parse flow XML"));
    }
}
