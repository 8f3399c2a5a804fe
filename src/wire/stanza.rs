use crate::error::Result;
use crate::wire::envelope::{PQC_AUTH, PQC_NS};
use crate::wire::xml::Element;

pub const CLIENT_NS: &str = "jabber:client";
pub const RECEIPTS_NS: &str = "urn:xmpp:receipts";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Chat,
    Normal,
    Groupchat,
    Headline,
    Error,
}

impl MessageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageKind::Chat => "chat",
            MessageKind::Normal => "normal",
            MessageKind::Groupchat => "groupchat",
            MessageKind::Headline => "headline",
            MessageKind::Error => "error",
        }
    }

    pub fn from_attr(value: Option<&str>) -> Self {
        match value {
            Some("chat") => MessageKind::Chat,
            Some("groupchat") => MessageKind::Groupchat,
            Some("headline") => MessageKind::Headline,
            Some("error") => MessageKind::Error,
            _ => MessageKind::Normal,
        }
    }

    pub fn is_conversational(&self) -> bool {
        matches!(self, MessageKind::Chat | MessageKind::Normal)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub id: String,
    pub from: String,
    pub to: String,
    pub kind: MessageKind,
    pub body: String,
    pub request_receipt: bool,
    pub extension: Option<Element>,
}

impl ChatMessage {
    pub fn chat(id: &str, from: &str, to: &str, body: &str) -> Self {
        Self {
            id: id.to_string(),
            from: from.to_string(),
            to: to.to_string(),
            kind: MessageKind::Chat,
            body: body.to_string(),
            request_receipt: false,
            extension: None,
        }
    }

    pub fn with_receipt_request(mut self) -> Self {
        self.request_receipt = true;
        self
    }

    pub fn with_extension(mut self, extension: Element) -> Self {
        self.extension = Some(extension);
        self
    }

    pub fn extension(&self) -> Option<&Element> {
        self.extension.as_ref()
    }

    pub fn body_bytes(&self) -> usize {
        self.body.len()
    }

    fn from_element(element: &Element) -> Self {
        let body = element
            .get_child("body", CLIENT_NS)
            .map(|el| el.text().to_string())
            .unwrap_or_default();
        Self {
            id: element.attr("id").unwrap_or_default().to_string(),
            from: element.attr("from").unwrap_or_default().to_string(),
            to: element.attr("to").unwrap_or_default().to_string(),
            kind: MessageKind::from_attr(element.attr("type")),
            body,
            request_receipt: element.get_child("request", RECEIPTS_NS).is_some(),
            extension: element.get_child(PQC_AUTH, PQC_NS).cloned(),
        }
    }

    fn to_element(&self) -> Element {
        let mut element = Element::new("message", Some(CLIENT_NS))
            .with_attr("id", &self.id)
            .with_attr("from", &self.from)
            .with_attr("to", &self.to)
            .with_attr("type", self.kind.as_str())
            .with_child(Element::new("body", Some(CLIENT_NS)).with_text(&self.body));
        if self.request_receipt {
            element.push_child(Element::new("request", Some(RECEIPTS_NS)));
        }
        if let Some(extension) = &self.extension {
            element.push_child(extension.clone());
        }
        element
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stanza {
    Message(ChatMessage),
    Receipt {
        from: String,
        to: String,
        received_id: String,
    },
    Presence {
        from: String,
    },
    Other(String),
}

impl Stanza {
    pub fn parse(input: &str) -> Result<Self> {
        let element = Element::parse(input)?;
        Ok(Self::from_element(&element))
    }

    pub fn from_element(element: &Element) -> Self {
        match element.name() {
            "message" => {
                if let Some(received) = element.get_child("received", RECEIPTS_NS) {
                    return Stanza::Receipt {
                        from: element.attr("from").unwrap_or_default().to_string(),
                        to: element.attr("to").unwrap_or_default().to_string(),
                        received_id: received.attr("id").unwrap_or_default().to_string(),
                    };
                }
                Stanza::Message(ChatMessage::from_element(element))
            }
            "presence" => Stanza::Presence {
                from: element.attr("from").unwrap_or_default().to_string(),
            },
            other => Stanza::Other(other.to_string()),
        }
    }

    pub fn to_element(&self) -> Element {
        match self {
            Stanza::Message(message) => message.to_element(),
            Stanza::Receipt {
                from,
                to,
                received_id,
            } => Element::new("message", Some(CLIENT_NS))
                .with_attr("from", from)
                .with_attr("to", to)
                .with_child(Element::new("received", Some(RECEIPTS_NS)).with_attr("id", received_id)),
            Stanza::Presence { from } => {
                Element::new("presence", Some(CLIENT_NS)).with_attr("from", from)
            }
            Stanza::Other(name) => Element::new(name, Some(CLIENT_NS)),
        }
    }

    pub fn to_xml(&self) -> Result<String> {
        self.to_element().to_xml()
    }
}
