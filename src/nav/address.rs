//! Postal address mapping.

use super::ConvertOptions;
use super::xml_utils::XmlWriter;
use crate::core::{Address, NavError};

/// NAV address: detailed (structured street data) or simple (one free-text line).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavAddress {
    Detailed(DetailedAddress),
    Simple(SimpleAddress),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailedAddress {
    pub country_code: String,
    pub region: Option<String>,
    pub postal_code: String,
    pub city: String,
    pub street_name: String,
    pub public_place_category: String,
    pub number: Option<String>,
    pub building: Option<String>,
    pub floor: Option<String>,
    pub door: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimpleAddress {
    pub country_code: String,
    pub region: Option<String>,
    pub postal_code: String,
    pub city: String,
    pub additional_address_detail: String,
}

impl NavAddress {
    /// Detailed when the address has a street type or the options force it.
    pub fn from_address(address: &Address, options: &ConvertOptions) -> Self {
        match (&address.street_type, options.detailed_addresses) {
            (Some(street_type), _) => Self::Detailed(detailed(address, street_type)),
            (None, true) => Self::Detailed(detailed(address, &options.public_place_category)),
            (None, false) => Self::Simple(SimpleAddress {
                country_code: address.country.clone(),
                region: address.region.clone(),
                postal_code: address.code.clone(),
                city: address.locality.clone(),
                additional_address_detail: address_detail(address),
            }),
        }
    }

    /// Write the address inside the already opened parent element.
    pub fn write_xml(&self, w: &mut XmlWriter) -> Result<(), NavError> {
        match self {
            Self::Detailed(a) => {
                w.start_element("base:detailedAddress")?;
                w.text_element("base:countryCode", &a.country_code)?;
                w.opt_text_element("base:region", a.region.as_deref())?;
                w.text_element("base:postalCode", &a.postal_code)?;
                w.text_element("base:city", &a.city)?;
                w.text_element("base:streetName", &a.street_name)?;
                w.text_element("base:publicPlaceCategory", &a.public_place_category)?;
                w.opt_text_element("base:number", a.number.as_deref())?;
                w.opt_text_element("base:building", a.building.as_deref())?;
                w.opt_text_element("base:floor", a.floor.as_deref())?;
                w.opt_text_element("base:door", a.door.as_deref())?;
                w.end_element("base:detailedAddress")?;
            }
            Self::Simple(a) => {
                w.start_element("base:simpleAddress")?;
                w.text_element("base:countryCode", &a.country_code)?;
                w.opt_text_element("base:region", a.region.as_deref())?;
                w.text_element("base:postalCode", &a.postal_code)?;
                w.text_element("base:city", &a.city)?;
                w.text_element("base:additionalAddressDetail", &a.additional_address_detail)?;
                w.end_element("base:simpleAddress")?;
            }
        }
        Ok(())
    }
}

fn detailed(address: &Address, category: &str) -> DetailedAddress {
    DetailedAddress {
        country_code: address.country.clone(),
        region: address.region.clone(),
        postal_code: address.code.clone(),
        city: address.locality.clone(),
        street_name: address.street.clone(),
        public_place_category: category.to_string(),
        number: address.number.clone(),
        building: address.block.clone(),
        floor: address.floor.clone(),
        door: address.door.clone(),
    }
}

/// Free-text street line of a simple address.
pub fn address_detail(address: &Address) -> String {
    if let Some(po_box) = non_empty(&address.po_box) {
        return format!("PO Box / Apdo {po_box}");
    }

    let mut detail = format!(
        "{}, {}",
        address.street,
        address.number.as_deref().unwrap_or_default()
    );
    if let Some(block) = non_empty(&address.block) {
        detail.push_str(", ");
        detail.push_str(block);
    }
    if let Some(floor) = non_empty(&address.floor) {
        detail.push_str(", ");
        detail.push_str(floor);
    }
    if let Some(door) = non_empty(&address.door) {
        detail.push(' ');
        detail.push_str(door);
    }
    if let Some(extra) = non_empty(&address.street_extra) {
        detail.push('\n');
        detail.push_str(extra);
    }
    detail
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}
