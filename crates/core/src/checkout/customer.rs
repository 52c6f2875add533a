//! The normalized customer record handed to the payment provider.

use serde::{Deserialize, Serialize};

use super::field::{CheckoutField, FormVariant};
use super::form::{FormData, FormErrors, validate_form};
use crate::types::phone;

/// Delivery address, one line for the street part.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    /// `"<number> <street>"`, followed by `", <apartment>"` when given.
    pub street: String,
    pub city: String,
    pub postal_code: String,
    pub country: String,
}

/// Customer details assembled at submission time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerRecord {
    pub first_name: String,
    pub last_name: String,
    /// Trimmed and lowercased.
    pub email: String,
    /// International form, e.g. `+33612345678`.
    pub phone: String,
    pub full_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<Address>,
}

impl CustomerRecord {
    /// Build the record from a draft.
    ///
    /// # Errors
    ///
    /// Returns the full error set if any required field of `variant` fails
    /// validation; no record is produced from invalid data.
    pub fn from_form(
        data: &FormData,
        variant: FormVariant,
        calling_code: &str,
    ) -> Result<Self, FormErrors> {
        let errors = validate_form(data, variant);
        if !errors.is_empty() {
            return Err(errors);
        }

        let first_name = data.get(CheckoutField::FirstName).trim().to_owned();
        let last_name = data.get(CheckoutField::LastName).trim().to_owned();
        let full_name = format!("{first_name} {last_name}");
        let phone = phone::to_international(
            &phone::strip_separators(data.get(CheckoutField::Phone)),
            calling_code,
        );

        Ok(Self {
            email: data.get(CheckoutField::Email).trim().to_lowercase(),
            phone,
            full_name,
            first_name,
            last_name,
            address: variant.captures_address().then(|| address_from(data)),
        })
    }
}

fn address_from(data: &FormData) -> Address {
    let mut street = format!(
        "{} {}",
        data.get(CheckoutField::StreetNumber).trim(),
        data.get(CheckoutField::Street).trim()
    );
    let apartment = data.get(CheckoutField::Apartment).trim();
    if !apartment.is_empty() {
        street.push_str(", ");
        street.push_str(apartment);
    }

    Address {
        street,
        city: data.get(CheckoutField::City).trim().to_owned(),
        postal_code: data.get(CheckoutField::PostalCode).trim().to_uppercase(),
        country: data.get(CheckoutField::Country).trim().to_owned(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::phone::FRENCH_CALLING_CODE;

    fn contact_data(phone: &str) -> FormData {
        FormData::new()
            .with(CheckoutField::FirstName, " Jean ")
            .with(CheckoutField::LastName, "Dupont")
            .with(CheckoutField::Email, "Jean@Example.com")
            .with(CheckoutField::Phone, phone)
    }

    #[test]
    fn test_contact_record() {
        let record =
            CustomerRecord::from_form(&contact_data("0612345678"), FormVariant::Contact, FRENCH_CALLING_CODE)
                .unwrap();

        assert_eq!(record.first_name, "Jean");
        assert_eq!(record.full_name, "Jean Dupont");
        assert_eq!(record.email, "jean@example.com");
        assert_eq!(record.phone, "+33612345678");
        assert!(record.address.is_none());
    }

    #[test]
    fn test_international_phone_is_kept() {
        let record = CustomerRecord::from_form(
            &contact_data("+44 20 7123 4567"),
            FormVariant::Contact,
            FRENCH_CALLING_CODE,
        )
        .unwrap();
        assert_eq!(record.phone, "+442071234567");
    }

    #[test]
    fn test_delivery_record_joins_address_line() {
        let data = contact_data("06 12 34 56 78")
            .with(CheckoutField::StreetNumber, "40")
            .with(CheckoutField::Street, "Rue de Thermes")
            .with(CheckoutField::Apartment, "Bât. B")
            .with(CheckoutField::PostalCode, "62100")
            .with(CheckoutField::City, "Calais")
            .with(CheckoutField::Country, "France");

        let record =
            CustomerRecord::from_form(&data, FormVariant::Delivery, FRENCH_CALLING_CODE).unwrap();
        let address = record.address.unwrap();
        assert_eq!(address.street, "40 Rue de Thermes, Bât. B");
        assert_eq!(address.city, "Calais");
        assert_eq!(address.postal_code, "62100");

        let without_apartment = data.with(CheckoutField::Apartment, "  ");
        let record =
            CustomerRecord::from_form(&without_apartment, FormVariant::Delivery, FRENCH_CALLING_CODE)
                .unwrap();
        assert_eq!(record.address.unwrap().street, "40 Rue de Thermes");
    }

    #[test]
    fn test_invalid_form_produces_no_record() {
        let errors =
            CustomerRecord::from_form(&contact_data("123"), FormVariant::Contact, FRENCH_CALLING_CODE)
                .unwrap_err();
        assert!(errors.get(CheckoutField::Phone).is_some());
    }

    #[test]
    fn test_serializes_camel_case() {
        let record =
            CustomerRecord::from_form(&contact_data("0612345678"), FormVariant::Contact, FRENCH_CALLING_CODE)
                .unwrap();
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["firstName"], "Jean");
        assert_eq!(json["fullName"], "Jean Dupont");
        assert!(json.get("address").is_none());
    }
}
