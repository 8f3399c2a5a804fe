use quick_xml::escape::escape;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::name::ResolveResult;
use quick_xml::{NsReader, Writer};

use crate::error::{PqcBenchError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    name: String,
    ns: Option<String>,
    attrs: Vec<(String, String)>,
    children: Vec<Element>,
    text: String,
}

impl Element {
    pub fn new(name: &str, ns: Option<&str>) -> Self {
        Self {
            name: name.to_string(),
            ns: ns.map(str::to_string),
            attrs: Vec::new(),
            children: Vec::new(),
            text: String::new(),
        }
    }

    pub fn with_attr(mut self, key: &str, value: &str) -> Self {
        self.set_attr(key, value);
        self
    }

    pub fn with_child(mut self, child: Element) -> Self {
        self.children.push(child);
        self
    }

    pub fn with_text(mut self, text: &str) -> Self {
        self.text = text.to_string();
        self
    }

    pub fn set_attr(&mut self, key: &str, value: &str) {
        if let Some(existing) = self.attrs.iter_mut().find(|(k, _)| k == key) {
            existing.1 = value.to_string();
        } else {
            self.attrs.push((key.to_string(), value.to_string()));
        }
    }

    pub fn push_child(&mut self, child: Element) {
        self.children.push(child);
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ns(&self) -> Option<&str> {
        self.ns.as_deref()
    }

    pub fn is(&self, name: &str, ns: &str) -> bool {
        self.name == name && self.ns.as_deref() == Some(ns)
    }

    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn children(&self) -> impl Iterator<Item = &Element> {
        self.children.iter()
    }

    pub fn get_child(&self, name: &str, ns: &str) -> Option<&Element> {
        self.children.iter().find(|child| child.is(name, ns))
    }

    pub fn parse(input: &str) -> Result<Self> {
        let mut reader = NsReader::from_str(input);
        let mut stack: Vec<Element> = Vec::new();

        loop {
            let (resolved, event) = reader
                .read_resolved_event()
                .map_err(|e| PqcBenchError::Serialization(e.to_string()))?;
            let ns = match resolved {
                ResolveResult::Bound(ns) => Some(String::from_utf8_lossy(ns.0).into_owned()),
                _ => None,
            };
            match event {
                Event::Start(start) => {
                    stack.push(Self::from_start(&start, ns)?);
                }
                Event::Empty(start) => {
                    let element = Self::from_start(&start, ns)?;
                    match stack.last_mut() {
                        Some(parent) => parent.children.push(element),
                        None => return Ok(element),
                    }
                }
                Event::Text(text) => {
                    if let Some(current) = stack.last_mut() {
                        let unescaped = text
                            .unescape()
                            .map_err(|e| PqcBenchError::Serialization(e.to_string()))?;
                        current.text.push_str(&unescaped);
                    }
                }
                Event::CData(data) => {
                    if let Some(current) = stack.last_mut() {
                        current
                            .text
                            .push_str(&String::from_utf8_lossy(&data.into_inner()));
                    }
                }
                Event::End(_) => {
                    let Some(finished) = stack.pop() else {
                        return Err(PqcBenchError::Serialization(
                            "unbalanced end tag".to_string(),
                        ));
                    };
                    match stack.last_mut() {
                        Some(parent) => parent.children.push(finished),
                        None => return Ok(finished),
                    }
                }
                Event::Eof => {
                    return Err(PqcBenchError::Serialization(
                        "unexpected end of document".to_string(),
                    ));
                }
                _ => {}
            }
        }
    }

    fn from_start(start: &BytesStart<'_>, ns: Option<String>) -> Result<Self> {
        let name = String::from_utf8_lossy(start.local_name().as_ref()).into_owned();
        let mut element = Element {
            name,
            ns,
            attrs: Vec::new(),
            children: Vec::new(),
            text: String::new(),
        };
        for attr in start.attributes() {
            let attr = attr.map_err(|e| PqcBenchError::Serialization(e.to_string()))?;
            if attr.key.as_namespace_binding().is_some() {
                continue;
            }
            let key = String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned();
            let value = attr
                .unescape_value()
                .map_err(|e| PqcBenchError::Serialization(e.to_string()))?;
            element.attrs.push((key, value.into_owned()));
        }
        Ok(element)
    }

    pub fn to_xml(&self) -> Result<String> {
        let mut writer = Writer::new(Vec::new());
        self.write_into(&mut writer, None)?;
        String::from_utf8(writer.into_inner())
            .map_err(|e| PqcBenchError::Serialization(e.to_string()))
    }

    fn write_into(&self, writer: &mut Writer<Vec<u8>>, parent_ns: Option<&str>) -> Result<()> {
        let mut start = BytesStart::new(self.name.as_str());
        if let Some(ns) = self.ns.as_deref() {
            if parent_ns != Some(ns) {
                start.push_attribute(("xmlns", ns));
            }
        }
        for (key, value) in &self.attrs {
            start.push_attribute((key.as_str(), value.as_str()));
        }

        if self.children.is_empty() && self.text.is_empty() {
            return writer
                .write_event(Event::Empty(start))
                .map_err(|e| PqcBenchError::Serialization(e.to_string()));
        }

        writer
            .write_event(Event::Start(start))
            .map_err(|e| PqcBenchError::Serialization(e.to_string()))?;
        if !self.text.is_empty() {
            // stanzas travel one per line
            let escaped = escape(self.text.as_str())
                .replace('\n', "&#10;")
                .replace('\r', "&#13;");
            writer
                .write_event(Event::Text(BytesText::from_escaped(escaped)))
                .map_err(|e| PqcBenchError::Serialization(e.to_string()))?;
        }
        let own_ns = self.ns.as_deref().or(parent_ns);
        for child in &self.children {
            child.write_into(writer, own_ns)?;
        }
        writer
            .write_event(Event::End(BytesEnd::new(self.name.as_str())))
            .map_err(|e| PqcBenchError::Serialization(e.to_string()))
    }
}
