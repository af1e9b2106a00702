//! XML-RPC wire codec.
//!
//! Parses `<methodCall>` documents into [`MethodCall`] and renders
//! `<methodResponse>` / fault documents. Only the value types MetaWeblog
//! clients actually send are supported.

use std::collections::BTreeMap;

use base64::Engine;
use quick_xml::events::Event;
use quick_xml::Reader;

/// A decoding or structural error in an XML-RPC document.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("XML parse error: {0}")]
    Xml(String),

    #[error("Malformed XML-RPC document: {0}")]
    Malformed(String),
}

/// An XML-RPC value.
#[derive(Debug, Clone, PartialEq)]
pub enum XmlRpcValue {
    String(String),
    Int(i64),
    Bool(bool),
    Double(f64),
    /// `dateTime.iso8601` content, kept verbatim; callers parse it.
    DateTime(String),
    Base64(Vec<u8>),
    Array(Vec<XmlRpcValue>),
    Struct(BTreeMap<String, XmlRpcValue>),
}

impl XmlRpcValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            XmlRpcValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            XmlRpcValue::Int(n) => Some(*n),
            // Lenient: some clients send numbers as strings.
            XmlRpcValue::String(s) => s.parse().ok(),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            XmlRpcValue::Bool(b) => Some(*b),
            XmlRpcValue::Int(n) => Some(*n != 0),
            XmlRpcValue::String(s) => match s.as_str() {
                "1" | "true" => Some(true),
                "0" | "false" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[XmlRpcValue]> {
        match self {
            XmlRpcValue::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_struct(&self) -> Option<&BTreeMap<String, XmlRpcValue>> {
        match self {
            XmlRpcValue::Struct(members) => Some(members),
            _ => None,
        }
    }
}

/// A parsed `<methodCall>`.
#[derive(Debug)]
pub struct MethodCall {
    pub name: String,
    pub params: Vec<XmlRpcValue>,
}

impl MethodCall {
    /// Positional parameter accessor with a structural error on absence.
    pub fn param(&self, index: usize) -> Result<&XmlRpcValue, CodecError> {
        self.params.get(index).ok_or_else(|| {
            CodecError::Malformed(format!("{} is missing parameter {index}", self.name))
        })
    }
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// A minimal element tree; XML-RPC documents are tiny so building one is
/// simpler than streaming interpretation.
#[derive(Debug, Default)]
struct Node {
    name: String,
    text: String,
    children: Vec<Node>,
}

impl Node {
    fn child(&self, name: &str) -> Option<&Node> {
        self.children.iter().find(|c| c.name == name)
    }

    fn require(&self, name: &str) -> Result<&Node, CodecError> {
        self.child(name)
            .ok_or_else(|| CodecError::Malformed(format!("missing <{name}> in <{}>", self.name)))
    }
}

fn parse_tree(xml: &str) -> Result<Node, CodecError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<Node> = vec![Node::default()];
    loop {
        match reader.read_event().map_err(|e| CodecError::Xml(e.to_string()))? {
            Event::Start(start) => {
                let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
                stack.push(Node {
                    name,
                    ..Node::default()
                });
            }
            Event::End(_) => {
                let node = stack.pop().ok_or_else(|| {
                    CodecError::Malformed("unbalanced closing tag".into())
                })?;
                match stack.last_mut() {
                    Some(parent) => parent.children.push(node),
                    None => return Err(CodecError::Malformed("unbalanced closing tag".into())),
                }
            }
            Event::Empty(start) => {
                let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
                match stack.last_mut() {
                    Some(parent) => parent.children.push(Node {
                        name,
                        ..Node::default()
                    }),
                    None => return Err(CodecError::Malformed("element outside document".into())),
                }
            }
            Event::Text(text) => {
                let decoded = text
                    .unescape()
                    .map_err(|e| CodecError::Xml(e.to_string()))?;
                if let Some(node) = stack.last_mut() {
                    node.text.push_str(&decoded);
                }
            }
            Event::CData(data) => {
                let decoded = String::from_utf8_lossy(&data).into_owned();
                if let Some(node) = stack.last_mut() {
                    node.text.push_str(&decoded);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    let mut root = stack.pop().ok_or_else(|| {
        CodecError::Malformed("empty document".into())
    })?;
    if !stack.is_empty() {
        return Err(CodecError::Malformed("unclosed element".into()));
    }
    if root.children.len() != 1 {
        return Err(CodecError::Malformed(
            "expected exactly one root element".into(),
        ));
    }
    Ok(root.children.remove(0))
}

/// Parse a `<methodCall>` document.
pub fn parse_method_call(xml: &str) -> Result<MethodCall, CodecError> {
    let root = parse_tree(xml)?;
    if root.name != "methodCall" {
        return Err(CodecError::Malformed(format!(
            "expected <methodCall>, got <{}>",
            root.name
        )));
    }

    let name = root.require("methodName")?.text.trim().to_string();
    if name.is_empty() {
        return Err(CodecError::Malformed("empty <methodName>".into()));
    }

    let mut params = Vec::new();
    if let Some(params_node) = root.child("params") {
        for param in params_node.children.iter().filter(|c| c.name == "param") {
            params.push(interpret_value(param.require("value")?)?);
        }
    }

    Ok(MethodCall { name, params })
}

fn interpret_value(value: &Node) -> Result<XmlRpcValue, CodecError> {
    // A bare <value>text</value> is a string per the XML-RPC spec.
    let Some(typed) = value.children.first() else {
        return Ok(XmlRpcValue::String(value.text.clone()));
    };

    let text = typed.text.trim();
    match typed.name.as_str() {
        "string" => Ok(XmlRpcValue::String(typed.text.clone())),
        "int" | "i4" => text
            .parse()
            .map(XmlRpcValue::Int)
            .map_err(|_| CodecError::Malformed(format!("invalid int '{text}'"))),
        "boolean" => match text {
            "1" | "true" => Ok(XmlRpcValue::Bool(true)),
            "0" | "false" => Ok(XmlRpcValue::Bool(false)),
            other => Err(CodecError::Malformed(format!("invalid boolean '{other}'"))),
        },
        "double" => text
            .parse()
            .map(XmlRpcValue::Double)
            .map_err(|_| CodecError::Malformed(format!("invalid double '{text}'"))),
        "dateTime.iso8601" => Ok(XmlRpcValue::DateTime(text.to_string())),
        "base64" => {
            let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
            base64::engine::general_purpose::STANDARD
                .decode(compact.as_bytes())
                .map(XmlRpcValue::Base64)
                .map_err(|e| CodecError::Malformed(format!("invalid base64: {e}")))
        }
        "array" => {
            let data = typed.require("data")?;
            let mut items = Vec::new();
            for child in data.children.iter().filter(|c| c.name == "value") {
                items.push(interpret_value(child)?);
            }
            Ok(XmlRpcValue::Array(items))
        }
        "struct" => {
            let mut members = BTreeMap::new();
            for member in typed.children.iter().filter(|c| c.name == "member") {
                let name = member.require("name")?.text.trim().to_string();
                let value = interpret_value(member.require("value")?)?;
                members.insert(name, value);
            }
            Ok(XmlRpcValue::Struct(members))
        }
        other => Err(CodecError::Malformed(format!("unknown value type <{other}>"))),
    }
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            other => out.push(other),
        }
    }
    out
}

fn write_value(value: &XmlRpcValue, out: &mut String) {
    out.push_str("<value>");
    match value {
        XmlRpcValue::String(s) => {
            out.push_str("<string>");
            out.push_str(&escape_xml(s));
            out.push_str("</string>");
        }
        XmlRpcValue::Int(n) => {
            out.push_str("<int>");
            out.push_str(&n.to_string());
            out.push_str("</int>");
        }
        XmlRpcValue::Bool(b) => {
            out.push_str("<boolean>");
            out.push_str(if *b { "1" } else { "0" });
            out.push_str("</boolean>");
        }
        XmlRpcValue::Double(d) => {
            out.push_str("<double>");
            out.push_str(&d.to_string());
            out.push_str("</double>");
        }
        XmlRpcValue::DateTime(s) => {
            out.push_str("<dateTime.iso8601>");
            out.push_str(&escape_xml(s));
            out.push_str("</dateTime.iso8601>");
        }
        XmlRpcValue::Base64(bytes) => {
            out.push_str("<base64>");
            out.push_str(&base64::engine::general_purpose::STANDARD.encode(bytes));
            out.push_str("</base64>");
        }
        XmlRpcValue::Array(items) => {
            out.push_str("<array><data>");
            for item in items {
                write_value(item, out);
            }
            out.push_str("</data></array>");
        }
        XmlRpcValue::Struct(members) => {
            out.push_str("<struct>");
            for (name, member) in members {
                out.push_str("<member><name>");
                out.push_str(&escape_xml(name));
                out.push_str("</name>");
                write_value(member, out);
                out.push_str("</member>");
            }
            out.push_str("</struct>");
        }
    }
    out.push_str("</value>");
}

/// Render a successful `<methodResponse>` carrying one value.
pub fn response_xml(value: &XmlRpcValue) -> String {
    let mut out = String::from(
        "<?xml version=\"1.0\"?>\n<methodResponse><params><param>",
    );
    write_value(value, &mut out);
    out.push_str("</param></params></methodResponse>");
    out
}

/// Render a `<fault>` response.
pub fn fault_xml(code: i64, message: &str) -> String {
    let mut members = BTreeMap::new();
    members.insert("faultCode".to_string(), XmlRpcValue::Int(code));
    members.insert(
        "faultString".to_string(),
        XmlRpcValue::String(message.to_string()),
    );
    let mut out = String::from("<?xml version=\"1.0\"?>\n<methodResponse><fault>");
    write_value(&XmlRpcValue::Struct(members), &mut out);
    out.push_str("</fault></methodResponse>");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_new_post_call() {
        let xml = r#"<?xml version="1.0"?>
            <methodCall>
              <methodName>metaWeblog.newPost</methodName>
              <params>
                <param><value><string>1</string></value></param>
                <param><value>admin</value></param>
                <param><value><string>secret</string></value></param>
                <param><value><struct>
                  <member><name>title</name><value><string>Hello</string></value></member>
                  <member><name>description</name><value><string>&lt;p&gt;Hi&lt;/p&gt;</string></value></member>
                  <member><name>categories</name><value><array><data>
                    <value><string>Tech</string></value>
                  </data></array></value></member>
                </struct></value></param>
                <param><value><boolean>1</boolean></value></param>
              </params>
            </methodCall>"#;

        let call = parse_method_call(xml).unwrap();
        assert_eq!(call.name, "metaWeblog.newPost");
        assert_eq!(call.params.len(), 5);
        // Bare <value> text is a string.
        assert_eq!(call.param(1).unwrap().as_str(), Some("admin"));

        let content = call.param(3).unwrap().as_struct().unwrap();
        assert_eq!(content["title"].as_str(), Some("Hello"));
        assert_eq!(content["description"].as_str(), Some("<p>Hi</p>"));
        let cats = content["categories"].as_array().unwrap();
        assert_eq!(cats[0].as_str(), Some("Tech"));

        assert_eq!(call.param(4).unwrap().as_bool(), Some(true));
    }

    #[test]
    fn parses_base64_and_datetime() {
        let xml = r#"<methodCall><methodName>m</methodName><params>
            <param><value><base64>aGVsbG8=</base64></value></param>
            <param><value><dateTime.iso8601>20260815T10:30:00</dateTime.iso8601></value></param>
        </params></methodCall>"#;

        let call = parse_method_call(xml).unwrap();
        assert_eq!(
            call.param(0).unwrap(),
            &XmlRpcValue::Base64(b"hello".to_vec())
        );
        assert_eq!(
            call.param(1).unwrap(),
            &XmlRpcValue::DateTime("20260815T10:30:00".into())
        );
    }

    #[test]
    fn rejects_malformed_documents() {
        assert!(parse_method_call("<notXmlRpc/>").is_err());
        assert!(parse_method_call("<methodCall></methodCall>").is_err());
        assert!(parse_method_call("not xml at all").is_err());
        assert!(parse_method_call(
            "<methodCall><methodName>m</methodName><params>\
             <param><value><int>abc</int></value></param></params></methodCall>"
        )
        .is_err());
    }

    #[test]
    fn renders_a_response_round_trippable_by_eye() {
        let mut members = BTreeMap::new();
        members.insert("postid".into(), XmlRpcValue::String("42".into()));
        members.insert("title".into(), XmlRpcValue::String("A & B".into()));
        let xml = response_xml(&XmlRpcValue::Struct(members));

        assert!(xml.starts_with("<?xml version=\"1.0\"?>"));
        assert!(xml.contains("<name>postid</name><value><string>42</string></value>"));
        assert!(xml.contains("A &amp; B"));
        assert!(xml.ends_with("</methodResponse>"));
    }

    #[test]
    fn renders_faults() {
        let xml = fault_xml(404, "Post not found");
        assert!(xml.contains("<fault>"));
        assert!(xml.contains("<name>faultCode</name><value><int>404</int></value>"));
        assert!(xml.contains("Post not found"));
    }

    #[test]
    fn int_coercions_are_lenient() {
        assert_eq!(XmlRpcValue::String("7".into()).as_i64(), Some(7));
        assert_eq!(XmlRpcValue::Int(1).as_bool(), Some(true));
        assert_eq!(XmlRpcValue::String("false".into()).as_bool(), Some(false));
    }
}
