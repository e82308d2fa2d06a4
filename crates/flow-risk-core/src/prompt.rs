/// Token replaced by the serialised flow structure.
pub const JSON_PLACEHOLDER: &str = "{JSON}";

/// Built-in instructions used when no custom template is configured.
pub const DEFAULT_PROMPT_TEMPLATE: &str = r#"You are a Salesforce release reviewer. Analyze the following Salesforce Flow definition (converted from XML to JSON) for deployment risks: hardcoded record or user IDs, DML or SOQL inside loops, missing fault paths, unhandled null values, recursion through record-triggered updates, governor limit exposure, and security or sharing concerns.

Respond only with JSON in this exact shape:
{"risks": [{"Risk": "short title", "Description": "what is wrong and where", "Recommendation": "how to fix it"}]}
If there are no risks, respond with {"risks": []}.

Flow definition:
{JSON}"#;

/// Substitute the first `{JSON}` in `template`. Templates without the
/// placeholder are returned unchanged.
pub fn build_prompt(template: &str, flow_json: &str) -> String {
    template.replacen(JSON_PLACEHOLDER, flow_json, 1)
}
