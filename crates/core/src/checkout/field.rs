//! Checkout form fields and the two form variants.

use core::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A field of the checkout form.
///
/// The serialized name is the camelCase form name (`firstName`,
/// `postalCode`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CheckoutField {
    FirstName,
    LastName,
    Email,
    Phone,
    StreetNumber,
    Street,
    Apartment,
    PostalCode,
    City,
    Country,
}

impl CheckoutField {
    /// Contact fields, common to both variants.
    pub const CONTACT: [Self; 4] = [Self::FirstName, Self::LastName, Self::Email, Self::Phone];

    /// Address fields, delivery variant only.
    pub const ADDRESS: [Self; 6] = [
        Self::StreetNumber,
        Self::Street,
        Self::Apartment,
        Self::PostalCode,
        Self::City,
        Self::Country,
    ];

    /// Form name used in HTML and JSON.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::FirstName => "firstName",
            Self::LastName => "lastName",
            Self::Email => "email",
            Self::Phone => "phone",
            Self::StreetNumber => "streetNumber",
            Self::Street => "street",
            Self::Apartment => "apartment",
            Self::PostalCode => "postalCode",
            Self::City => "city",
            Self::Country => "country",
        }
    }

    /// French label shown next to the input.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::FirstName => "Prénom",
            Self::LastName => "Nom",
            Self::Email => "Adresse email",
            Self::Phone => "Numéro de téléphone",
            Self::StreetNumber => "Numéro",
            Self::Street => "Rue",
            Self::Apartment => "Appartement, étage",
            Self::PostalCode => "Code postal",
            Self::City => "Ville",
            Self::Country => "Pays",
        }
    }

    /// Example value shown as placeholder.
    #[must_use]
    pub const fn placeholder(self) -> &'static str {
        match self {
            Self::FirstName => "Jean",
            Self::LastName => "Dupont",
            Self::Email => "votre.email@exemple.com",
            Self::Phone => "06 12 34 56 78 ou +33 6 12 34 56 78",
            Self::StreetNumber => "40",
            Self::Street => "Rue de Thermes",
            Self::Apartment => "Bât. B, 2e étage",
            Self::PostalCode => "62100",
            Self::City => "Calais",
            Self::Country => "France",
        }
    }

    /// HTML input type.
    #[must_use]
    pub const fn input_type(self) -> &'static str {
        match self {
            Self::Email => "email",
            Self::Phone => "tel",
            _ => "text",
        }
    }

    /// HTML `maxlength`.
    #[must_use]
    pub const fn max_length(self) -> usize {
        match self {
            Self::Email => 100,
            Self::Phone => 20,
            Self::StreetNumber | Self::PostalCode => 10,
            _ => 50,
        }
    }

    /// Whether an empty value blocks submission.
    #[must_use]
    pub const fn is_required(self) -> bool {
        !matches!(self, Self::Apartment)
    }
}

impl fmt::Display for CheckoutField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error returned when a form name matches no checkout field.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown checkout field: {0}")]
pub struct UnknownField(pub String);

impl FromStr for CheckoutField {
    type Err = UnknownField;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::CONTACT
            .into_iter()
            .chain(Self::ADDRESS)
            .find(|field| field.name() == s)
            .ok_or_else(|| UnknownField(s.to_owned()))
    }
}

/// Which checkout form is in use.
///
/// `Contact` captures who is ordering; `Delivery` adds the delivery address
/// and checks the phone number with the relaxed rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormVariant {
    Contact,
    #[default]
    Delivery,
}

impl FormVariant {
    /// Fields shown by this variant, in display order.
    #[must_use]
    pub fn fields(self) -> Vec<CheckoutField> {
        match self {
            Self::Contact => CheckoutField::CONTACT.to_vec(),
            Self::Delivery => CheckoutField::CONTACT
                .into_iter()
                .chain(CheckoutField::ADDRESS)
                .collect(),
        }
    }

    /// Fields validated on submit.
    pub fn required_fields(self) -> impl Iterator<Item = CheckoutField> {
        self.fields().into_iter().filter(|field| field.is_required())
    }

    #[must_use]
    pub const fn captures_address(self) -> bool {
        matches!(self, Self::Delivery)
    }
}

impl FromStr for FormVariant {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "contact" => Ok(Self::Contact),
            "delivery" => Ok(Self::Delivery),
            other => Err(format!("expected 'contact' or 'delivery', got '{other}'")),
        }
    }
}
