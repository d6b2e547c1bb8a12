use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use rust_decimal::{Decimal, RoundingStrategy};
use std::io::Cursor;

use crate::core::NavError;

fn xml_io(e: std::io::Error) -> NavError {
    NavError::Xml(format!("XML write error: {e}"))
}

/// Indented XML writer with an UTF-8 declaration.
pub struct XmlWriter {
    writer: Writer<Cursor<Vec<u8>>>,
}

impl XmlWriter {
    pub fn new() -> Result<Self, NavError> {
        let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2);
        writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
            .map_err(xml_io)?;
        Ok(Self { writer })
    }

    pub fn into_string(self) -> Result<String, NavError> {
        let buf = self.writer.into_inner().into_inner();
        String::from_utf8(buf).map_err(|e| NavError::Xml(format!("XML UTF-8 error: {e}")))
    }

    pub fn start_element(&mut self, name: &str) -> Result<&mut Self, NavError> {
        self.writer
            .write_event(Event::Start(BytesStart::new(name)))
            .map_err(xml_io)?;
        Ok(self)
    }

    pub fn start_element_with_attrs(
        &mut self,
        name: &str,
        attrs: &[(&str, &str)],
    ) -> Result<&mut Self, NavError> {
        let mut elem = BytesStart::new(name);
        for (k, v) in attrs {
            elem.push_attribute((*k, *v));
        }
        self.writer
            .write_event(Event::Start(elem))
            .map_err(xml_io)?;
        Ok(self)
    }

    pub fn end_element(&mut self, name: &str) -> Result<&mut Self, NavError> {
        self.writer
            .write_event(Event::End(BytesEnd::new(name)))
            .map_err(xml_io)?;
        Ok(self)
    }

    pub fn text_element(&mut self, name: &str, text: &str) -> Result<&mut Self, NavError> {
        self.start_element(name)?;
        self.writer
            .write_event(Event::Text(BytesText::new(text)))
            .map_err(xml_io)?;
        self.end_element(name)
    }

    pub fn text_element_with_attrs(
        &mut self,
        name: &str,
        text: &str,
        attrs: &[(&str, &str)],
    ) -> Result<&mut Self, NavError> {
        self.start_element_with_attrs(name, attrs)?;
        self.writer
            .write_event(Event::Text(BytesText::new(text)))
            .map_err(xml_io)?;
        self.end_element(name)
    }

    /// Write the element only when `text` is present.
    pub fn opt_text_element(
        &mut self,
        name: &str,
        text: Option<&str>,
    ) -> Result<&mut Self, NavError> {
        if let Some(text) = text {
            self.text_element(name, text)?;
        }
        Ok(self)
    }

    /// Write a monetary amount with exactly two decimal digits.
    pub fn amount_element(&mut self, name: &str, amount: Decimal) -> Result<&mut Self, NavError> {
        self.text_element(name, &format_amount(amount))
    }

    pub fn bool_element(&mut self, name: &str, value: bool) -> Result<&mut Self, NavError> {
        self.text_element(name, if value { "true" } else { "false" })
    }
}

/// Round half away from zero to two decimals and always print both digits.
pub fn format_amount(d: Decimal) -> String {
    let mut rounded = d.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    if rounded.is_zero() {
        // no "-0.00"
        rounded = Decimal::ZERO;
    }
    rounded.rescale(2);
    rounded.to_string()
}

/// Format a non-monetary Decimal (quantity, rate) without trailing zeros.
pub fn format_decimal(d: Decimal) -> String {
    d.normalize().to_string()
}
