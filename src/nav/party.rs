//! Supplier and customer blocks of the invoice head.

use super::ConvertOptions;
use super::address::NavAddress;
use super::taxnumber::{TaxNumber, decompose};
use super::xml_utils::XmlWriter;
use crate::core::{NavError, Party, TaxIdentity, is_eu_tax_country};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupplierInfo {
    pub tax_number: TaxNumber,
    pub group_member_tax_number: Option<TaxNumber>,
    pub name: String,
    pub address: NavAddress,
}

impl SupplierInfo {
    /// The supplier must have a Hungarian tax identity and an address.
    pub fn from_party(party: &Party, options: &ConvertOptions) -> Result<Self, NavError> {
        let tax_id = party
            .tax_id
            .as_ref()
            .ok_or_else(|| NavError::MissingTaxId("supplier".into()))?;
        if !tax_id.is_hungarian() {
            return Err(NavError::NotHungarian(tax_id.country.clone()));
        }
        let (tax_number, group_member_tax_number) = decompose(party)?;
        let address = party
            .address()
            .ok_or_else(|| NavError::MissingAddress("supplier".into()))?;

        Ok(Self {
            tax_number,
            group_member_tax_number,
            name: party.name.clone(),
            address: NavAddress::from_address(address, options),
        })
    }

    pub fn write_xml(&self, w: &mut XmlWriter) -> Result<(), NavError> {
        w.start_element("supplierInfo")?;
        write_tax_number(w, "supplierTaxNumber", &self.tax_number)?;
        if let Some(member) = &self.group_member_tax_number {
            write_tax_number(w, "groupMemberTaxNumber", member)?;
        }
        w.text_element("supplierName", &self.name)?;
        w.start_element("supplierAddress")?;
        self.address.write_xml(w)?;
        w.end_element("supplierAddress")?;
        w.end_element("supplierInfo")?;
        Ok(())
    }
}

/// VAT status of the customer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CustomerVatStatus {
    PrivatePerson,
    Domestic,
    Other,
}

impl CustomerVatStatus {
    pub fn code(&self) -> &'static str {
        match self {
            Self::PrivatePerson => "PRIVATE_PERSON",
            Self::Domestic => "DOMESTIC",
            Self::Other => "OTHER",
        }
    }
}

/// Customer VAT data; private persons carry none.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CustomerVatData {
    TaxNumber {
        tax_number: TaxNumber,
        group_member: Option<TaxNumber>,
    },
    CommunityVatNumber(String),
    ThirdStateTaxId(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomerInfo {
    pub status: CustomerVatStatus,
    pub vat_data: Option<CustomerVatData>,
    pub name: String,
    pub address: Option<NavAddress>,
}

impl CustomerInfo {
    pub fn from_party(party: &Party, options: &ConvertOptions) -> Result<Self, NavError> {
        let (status, vat_data) = match &party.tax_id {
            None => (CustomerVatStatus::PrivatePerson, None),
            Some(tax_id) if tax_id.is_hungarian() && is_private_marker(&tax_id.code) => {
                (CustomerVatStatus::PrivatePerson, None)
            }
            Some(tax_id) if tax_id.is_hungarian() => {
                let (tax_number, group_member) = decompose(party)?;
                (
                    CustomerVatStatus::Domestic,
                    Some(CustomerVatData::TaxNumber {
                        tax_number,
                        group_member,
                    }),
                )
            }
            Some(tax_id) => (CustomerVatStatus::Other, Some(foreign_vat_data(tax_id))),
        };

        Ok(Self {
            status,
            vat_data,
            name: party.name.clone(),
            address: party
                .address()
                .map(|a| NavAddress::from_address(a, options)),
        })
    }

    pub fn write_xml(&self, w: &mut XmlWriter) -> Result<(), NavError> {
        w.start_element("customerInfo")?;
        w.text_element("customerVatStatus", self.status.code())?;
        if let Some(data) = &self.vat_data {
            w.start_element("customerVatData")?;
            match data {
                CustomerVatData::TaxNumber {
                    tax_number,
                    group_member,
                } => {
                    w.start_element("customerTaxNumber")?;
                    write_tax_number_fields(w, tax_number)?;
                    if let Some(member) = group_member {
                        write_tax_number(w, "groupMemberTaxNumber", member)?;
                    }
                    w.end_element("customerTaxNumber")?;
                }
                CustomerVatData::CommunityVatNumber(number) => {
                    w.text_element("communityVatNumber", number)?;
                }
                CustomerVatData::ThirdStateTaxId(id) => {
                    w.text_element("thirdStateTaxId", id)?;
                }
            }
            w.end_element("customerVatData")?;
        }
        if !self.name.is_empty() {
            w.text_element("customerName", &self.name)?;
        }
        if let Some(address) = &self.address {
            w.start_element("customerAddress")?;
            address.write_xml(w)?;
            w.end_element("customerAddress")?;
        }
        w.end_element("customerInfo")?;
        Ok(())
    }
}

/// Hungarian codes that identify a private person: empty, or a 10-digit
/// tax identification sign starting with 8.
fn is_private_marker(code: &str) -> bool {
    code.is_empty() || (code.starts_with('8') && code.len() == 10)
}

fn foreign_vat_data(tax_id: &TaxIdentity) -> CustomerVatData {
    if is_eu_tax_country(&tax_id.country) {
        CustomerVatData::CommunityVatNumber(tax_id.to_string())
    } else {
        CustomerVatData::ThirdStateTaxId(tax_id.to_string())
    }
}

fn write_tax_number(w: &mut XmlWriter, name: &str, number: &TaxNumber) -> Result<(), NavError> {
    w.start_element(name)?;
    write_tax_number_fields(w, number)?;
    w.end_element(name)?;
    Ok(())
}

fn write_tax_number_fields(w: &mut XmlWriter, number: &TaxNumber) -> Result<(), NavError> {
    w.text_element("base:taxpayerId", &number.taxpayer_id)?;
    w.opt_text_element("base:vatCode", number.vat_code.as_deref())?;
    w.opt_text_element("base:countyCode", number.county_code.as_deref())?;
    Ok(())
}
