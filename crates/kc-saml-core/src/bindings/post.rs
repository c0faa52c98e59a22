//! HTTP-POST Binding implementation.
//!
//! The serialized document is base64 encoded and carried in a hidden field
//! of an auto-submitting HTML form.

use base64::Engine;

use crate::constants::params;
use crate::xml::Document;

use super::MessageType;

/// A protected document ready for the HTTP-POST binding.
#[derive(Debug, Clone)]
pub struct PostBinding {
    document: Document,
    relay_state: Option<String>,
}

impl PostBinding {
    pub(crate) fn new(document: Document, relay_state: Option<String>) -> Self {
        Self {
            document,
            relay_state,
        }
    }

    /// Returns the base64 encoded document.
    #[must_use]
    pub fn encoded(&self) -> String {
        let xml = self.document.to_xml_string();
        tracing::trace!("SAML document: {}", xml);
        base64::engine::general_purpose::STANDARD.encode(xml)
    }

    /// Renders the auto-submitting form posting the document to `action`.
    #[must_use]
    pub fn html(&self, action: &str, message_type: MessageType) -> String {
        build_html_form(
            &self.encoded(),
            action,
            message_type,
            self.relay_state.as_deref(),
        )
    }

    /// Renders the form for a request message.
    #[must_use]
    pub fn html_request(&self, action: &str) -> String {
        self.html(action, MessageType::Request)
    }

    /// Renders the form for a response message.
    #[must_use]
    pub fn html_response(&self, action: &str) -> String {
        self.html(action, MessageType::Response)
    }

    /// Returns the protected document.
    #[must_use]
    pub const fn document(&self) -> &Document {
        &self.document
    }

    /// Consumes the binding, returning the protected document.
    #[must_use]
    pub fn into_document(self) -> Document {
        self.document
    }
}

/// Renders the HTTP-POST form for an already encoded payload.
///
/// `action` and `relay_state` are attribute-escaped; `payload` is expected
/// to be base64.
#[must_use]
pub fn build_html_form(
    payload: &str,
    action: &str,
    message_type: MessageType,
    relay_state: Option<&str>,
) -> String {
    let relay_state_input = relay_state
        .filter(|rs| !rs.is_empty())
        .map(|rs| {
            format!(
                r#"<INPUT TYPE="HIDDEN" NAME="{}" VALUE="{}"/>"#,
                params::RELAY_STATE,
                html_escape(rs)
            )
        })
        .unwrap_or_default();

    format!(
        concat!(
            "<HTML><HEAD><TITLE>SAML HTTP Post Binding</TITLE></HEAD>",
            r#"<BODY Onload="document.forms[0].submit()">"#,
            r#"<FORM METHOD="POST" ACTION="{}">"#,
            r#"<INPUT TYPE="HIDDEN" NAME="{}" VALUE="{}"/>"#,
            "{}",
            "<NOSCRIPT><P>JavaScript is disabled. We strongly recommend to enable it. Click the button below to continue.</P>",
            r#"<INPUT TYPE="SUBMIT" VALUE="CONTINUE"/></NOSCRIPT>"#,
            "</FORM></BODY></HTML>"
        ),
        html_escape(action),
        message_type.form_param(),
        html_escape(payload),
        relay_state_input
    )
}

/// Escapes HTML special characters.
fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}
