//! The new-listing form and its field rules

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

// ASCII digits only; `\d` would also accept other scripts.
static CONTACT_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]{11,12}$").expect("Invalid contact number regex"));

/// Fields of the new-listing form
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Field {
    Name,
    Model,
    Year,
    Km,
    Price,
    City,
    Whatsapp,
    Description,
}

impl Field {
    pub const ALL: [Field; 8] = [
        Field::Name,
        Field::Model,
        Field::Year,
        Field::Km,
        Field::Price,
        Field::City,
        Field::Whatsapp,
        Field::Description,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Field::Name => "name",
            Field::Model => "model",
            Field::Year => "year",
            Field::Km => "km",
            Field::Price => "price",
            Field::City => "city",
            Field::Whatsapp => "whatsapp",
            Field::Description => "description",
        }
    }

    fn required_message(&self) -> &'static str {
        match self {
            Field::Name => "Name is required!",
            Field::Model => "Car model is required!",
            Field::Year => "Car year is required!",
            Field::Km => "Car km is required!",
            Field::Price => "Car price is required!",
            Field::City => "City is required!",
            Field::Whatsapp => "WhatsApp is required!",
            Field::Description => "Description is required!",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Field {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Field::ALL
            .into_iter()
            .find(|field| field.as_str() == s)
            .ok_or_else(|| Error::general(format!("unknown form field: {}", s)))
    }
}

/// Why a field was rejected
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldError {
    Required,
    InvalidPhoneNumber,
}

impl FieldError {
    /// Inline message shown under the field
    pub fn message(&self, field: Field) -> &'static str {
        match self {
            FieldError::Required => field.required_message(),
            FieldError::InvalidPhoneNumber => "Invalid phone number!",
        }
    }
}

/// Errors of every rejected field, keyed by field
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors(BTreeMap<Field, FieldError>);

impl FieldErrors {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn get(&self, field: Field) -> Option<&FieldError> {
        self.0.get(&field)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Field, &FieldError)> {
        self.0.iter()
    }

    fn set(&mut self, field: Field, error: Option<FieldError>) {
        match error {
            Some(error) => {
                self.0.insert(field, error);
            }
            None => {
                self.0.remove(&field);
            }
        }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, error) in &self.0 {
            if !first {
                f.write_str("; ")?;
            }
            write!(f, "{}: {}", field, error.message(*field))?;
            first = false;
        }
        Ok(())
    }
}

/// Check one value against the rules of its field
pub fn validate_field(field: Field, value: &str) -> Option<FieldError> {
    if value.is_empty() {
        return Some(FieldError::Required);
    }
    if field == Field::Whatsapp && !CONTACT_PATTERN.is_match(value) {
        return Some(FieldError::InvalidPhoneNumber);
    }
    None
}

/// Values typed into the new-listing form
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListingForm {
    pub name: String,
    pub model: String,
    pub year: String,
    pub km: String,
    pub price: String,
    pub city: String,
    pub whatsapp: String,
    pub description: String,
    errors: FieldErrors,
}

impl ListingForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn value(&self, field: Field) -> &str {
        match field {
            Field::Name => &self.name,
            Field::Model => &self.model,
            Field::Year => &self.year,
            Field::Km => &self.km,
            Field::Price => &self.price,
            Field::City => &self.city,
            Field::Whatsapp => &self.whatsapp,
            Field::Description => &self.description,
        }
    }

    fn slot(&mut self, field: Field) -> &mut String {
        match field {
            Field::Name => &mut self.name,
            Field::Model => &mut self.model,
            Field::Year => &mut self.year,
            Field::Km => &mut self.km,
            Field::Price => &mut self.price,
            Field::City => &mut self.city,
            Field::Whatsapp => &mut self.whatsapp,
            Field::Description => &mut self.description,
        }
    }

    /// Store a value and validate that field right away
    pub fn set_field(&mut self, field: Field, value: &str) -> Option<FieldError> {
        *self.slot(field) = value.to_string();
        let error = validate_field(field, value);
        self.errors.set(field, error.clone());
        error
    }

    /// Validate every field, refreshing the inline errors
    pub fn validate(&mut self) -> Result<(), FieldErrors> {
        for field in Field::ALL {
            let error = validate_field(field, self.value(field));
            self.errors.set(field, error);
        }

        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(self.errors.clone())
        }
    }

    /// Errors from the last change or validation
    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    /// Clear every value and error
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled() -> ListingForm {
        let mut form = ListingForm::new();
        form.set_field(Field::Name, "Onix 1.0");
        form.set_field(Field::Model, "Flex Plus");
        form.set_field(Field::Year, "2016/2016");
        form.set_field(Field::Km, "23.900");
        form.set_field(Field::Price, "69.000");
        form.set_field(Field::City, "Campinas");
        form.set_field(Field::Whatsapp, "11900000000");
        form.set_field(Field::Description, "Single owner");
        form
    }

    #[test]
    fn contact_needs_eleven_or_twelve_digits() {
        assert_eq!(validate_field(Field::Whatsapp, "11900000000"), None);
        assert_eq!(validate_field(Field::Whatsapp, "119000000001"), None);

        for bad in [
            "1190000000",
            "1190000000012",
            "1190000000a",
            "(11)90000000",
            "11 900000000",
            "١١٩٠٠٠٠٠٠٠٠",
        ] {
            assert_eq!(
                validate_field(Field::Whatsapp, bad),
                Some(FieldError::InvalidPhoneNumber),
                "{} should be rejected",
                bad
            );
        }
    }

    #[test]
    fn empty_fields_are_required() {
        for field in Field::ALL {
            assert_eq!(validate_field(field, ""), Some(FieldError::Required));
        }
    }

    #[test]
    fn set_field_reports_and_clears_errors() {
        let mut form = ListingForm::new();
        assert_eq!(
            form.set_field(Field::Whatsapp, "123"),
            Some(FieldError::InvalidPhoneNumber)
        );
        assert_eq!(form.errors().len(), 1);

        assert_eq!(form.set_field(Field::Whatsapp, "11900000000"), None);
        assert!(form.errors().is_empty());
    }

    #[test]
    fn validate_lists_every_missing_field() {
        let mut form = ListingForm::new();
        form.set_field(Field::Name, "Gol");
        let errors = form.validate().unwrap_err();
        assert_eq!(errors.len(), 7);
        assert!(errors.get(Field::Name).is_none());
        assert_eq!(
            errors.get(Field::City).map(|e| e.message(Field::City)),
            Some("City is required!")
        );
    }

    #[test]
    fn filled_form_validates_and_resets() {
        let mut form = filled();
        assert!(form.validate().is_ok());
        form.reset();
        assert_eq!(form, ListingForm::new());
    }

    #[test]
    fn field_names_round_trip() {
        assert_eq!("whatsapp".parse::<Field>().unwrap(), Field::Whatsapp);
        assert!("color".parse::<Field>().is_err());
    }
}
