//! The forms a client fills in, and the task text they produce.

use std::fmt::{self, Display};
use std::ops::RangeInclusive;
use std::str::FromStr;

const QUOTE_AREA: RangeInclusive<u32> = 200..=10_000;
const QUOTE_BEDROOMS: RangeInclusive<u8> = 1..=5;
const QUICK_SIZE: RangeInclusive<u32> = 300..=10_000;
const QUICK_MIN_BUDGET: u64 = 100_000;
const QUICK_RATE_PER_SQFT: u64 = 2_000;
const LEAD_AREA: RangeInclusive<u32> = 500..=10_000;

/// Acknowledgement shown once a lead form is accepted.
pub const LEAD_CAPTURED: &str = "Lead captured successfully!";

/// Errors found while validating a form.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum FormError {
    /// A required field is blank.
    #[error("please fill in the {0} field")]
    Missing(&'static str),
    /// A number is outside its allowed range.
    #[error("{field} must be {expected}, got {value}")]
    OutOfRange {
        /// Name of the field.
        field: &'static str,
        /// The allowed range, in words.
        expected: String,
        /// The rejected value.
        value: u64,
    },
    /// A field holds something that is not one of its choices.
    #[error("`{value}` is not a valid {field}")]
    Invalid {
        /// Name of the field.
        field: &'static str,
        /// The rejected text.
        value: String,
    },
}

fn check_range<T>(
    field: &'static str,
    range: &RangeInclusive<T>,
    value: T,
) -> Result<(), FormError>
where
    T: PartialOrd + Display + Into<u64> + Copy,
{
    if range.contains(&value) {
        return Ok(());
    }
    Err(FormError::OutOfRange {
        field,
        expected: format!("between {} and {}", range.start(), range.end()),
        value: value.into(),
    })
}

fn check_present(field: &'static str, value: &str) -> Result<(), FormError> {
    if value.trim().is_empty() {
        return Err(FormError::Missing(field));
    }
    Ok(())
}

/// Number of floors of a home.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Floors {
    /// Ground floor only.
    #[default]
    Single,
    /// Ground floor plus one.
    Duplex,
    /// Ground floor plus two.
    GPlus2,
    /// Anything else.
    Other,
}

impl Display for Floors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Floors::Single => "Single",
            Floors::Duplex => "Duplex",
            Floors::GPlus2 => "G+2",
            Floors::Other => "Other",
        })
    }
}

impl FromStr for Floors {
    type Err = FormError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "single" => Ok(Floors::Single),
            "duplex" => Ok(Floors::Duplex),
            "g+2" => Ok(Floors::GPlus2),
            "other" => Ok(Floors::Other),
            _ => Err(FormError::Invalid {
                field: "floors",
                value: s.to_owned(),
            }),
        }
    }
}

/// Finish level of a home.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Finish {
    /// Basic finish.
    Basic,
    /// Standard finish.
    #[default]
    Standard,
    /// Premium finish.
    Premium,
}

impl Display for Finish {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Finish::Basic => "basic",
            Finish::Standard => "standard",
            Finish::Premium => "premium",
        })
    }
}

impl FromStr for Finish {
    type Err = FormError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "basic" => Ok(Finish::Basic),
            "standard" => Ok(Finish::Standard),
            "premium" => Ok(Finish::Premium),
            _ => Err(FormError::Invalid {
                field: "finish level",
                value: s.to_owned(),
            }),
        }
    }
}

/// The detailed quote form, answered by the builders team.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QuoteRequest {
    /// City of the site.
    pub city: String,
    /// Built-up area in sq.ft.
    pub built_up_sqft: u32,
    /// Number of floors.
    pub floors: Floors,
    /// Number of bedrooms.
    pub bedrooms: u8,
    /// Finish level.
    pub finish: Finish,
    /// Plot size, e.g. `24x50 ft`.
    pub plot: String,
    /// Special requirements, may be blank.
    pub special: String,
    /// Phone or email, may be blank.
    pub contact: String,
}

impl Default for QuoteRequest {
    fn default() -> Self {
        Self {
            city: "Salem".to_owned(),
            built_up_sqft: 1200,
            floors: Floors::default(),
            bedrooms: 3,
            finish: Finish::default(),
            plot: "24x50 ft".to_owned(),
            special: "Pooja room, Western kitchen".to_owned(),
            contact: String::new(),
        }
    }
}

impl QuoteRequest {
    /// Checks every field.
    pub fn validate(&self) -> Result<(), FormError> {
        check_present("city", &self.city)?;
        check_range("built-up area", &QUOTE_AREA, self.built_up_sqft)?;
        check_range("bedrooms", &QUOTE_BEDROOMS, self.bedrooms)?;
        check_present("plot size", &self.plot)
    }

    /// Validates the form and renders it as the team's task.
    pub fn to_task(&self) -> Result<String, FormError> {
        self.validate()?;
        let special = non_blank(&self.special).unwrap_or("None");
        let contact = non_blank(&self.contact).unwrap_or("NA");
        Ok(format!(
            "Client message: Build a {} sq.ft {} home in {}. {} BHK, {} finish, plot {}. Special: {special}. Contact: {contact}.",
            self.built_up_sqft,
            self.floors,
            self.city.trim(),
            self.bedrooms,
            self.finish,
            self.plot.trim(),
        ))
    }
}

fn non_blank(value: &str) -> Option<&str> {
    Some(value.trim()).filter(|value| !value.is_empty())
}

/// The quick estimate form, answered locally without a model.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QuickEstimate {
    /// Where the home is.
    pub location: String,
    /// Home size in sq.ft.
    pub size_sqft: u32,
    /// Budget in INR.
    pub budget: u64,
}

impl QuickEstimate {
    /// Checks every field.
    pub fn validate(&self) -> Result<(), FormError> {
        check_present("location", &self.location)?;
        check_range("home size", &QUICK_SIZE, self.size_sqft)?;
        if self.budget < QUICK_MIN_BUDGET {
            return Err(FormError::OutOfRange {
                field: "budget",
                expected: format!("at least {QUICK_MIN_BUDGET}"),
                value: self.budget,
            });
        }
        Ok(())
    }

    /// Returns the estimated cost in INR.
    #[inline]
    pub fn estimated_cost(&self) -> u64 {
        u64::from(self.size_sqft) * QUICK_RATE_PER_SQFT
    }

    /// Validates the form and describes the estimate.
    pub fn summary(&self) -> Result<String, FormError> {
        self.validate()?;
        Ok(format!(
            "Estimated cost for a {} sq.ft home in {} is around ₹{}*",
            self.size_sqft,
            self.location.trim(),
            group_thousands(self.estimated_cost()),
        ))
    }
}

/// The lead form.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LeadForm {
    /// Client name.
    pub name: String,
    /// Client phone.
    pub phone: String,
    /// Where the site is.
    pub location: String,
    /// Area in sq.ft.
    pub sqft: u32,
    /// Special requirements, may be blank.
    pub requirements: String,
}

impl LeadForm {
    /// Validates the form and returns the acknowledgement.
    pub fn submit(&self) -> Result<&'static str, FormError> {
        check_present("name", &self.name)?;
        check_present("phone", &self.phone)?;
        check_present("location", &self.location)?;
        check_range("area", &LEAD_AREA, self.sqft)?;
        info!("lead captured for {}", self.location.trim());
        Ok(LEAD_CAPTURED)
    }
}

/// Formats `value` with a comma between every group of three digits.
pub fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, digit) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    grouped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_task() {
        let request = QuoteRequest {
            special: String::new(),
            ..Default::default()
        };
        assert_eq!(
            request.to_task().unwrap(),
            "Client message: Build a 1200 sq.ft Single home in Salem. 3 BHK, standard finish, plot 24x50 ft. Special: None. Contact: NA."
        );
    }

    #[test]
    fn test_task_with_contact() {
        let request = QuoteRequest {
            city: "Chennai".to_owned(),
            floors: "g+2".parse().unwrap(),
            finish: "Premium".parse().unwrap(),
            contact: "ravi@example.com".to_owned(),
            special: "Pooja room".to_owned(),
            ..Default::default()
        };
        let task = request.to_task().unwrap();
        assert!(task.contains("G+2 home in Chennai"));
        assert!(task.contains("premium finish"));
        assert!(task.ends_with("Special: Pooja room. Contact: ravi@example.com."));
    }

    #[test]
    fn test_quote_validation() {
        let request = QuoteRequest {
            city: "  ".to_owned(),
            ..Default::default()
        };
        assert_eq!(request.to_task(), Err(FormError::Missing("city")));

        let request = QuoteRequest {
            built_up_sqft: 150,
            ..Default::default()
        };
        assert!(matches!(
            request.validate(),
            Err(FormError::OutOfRange { field: "built-up area", value: 150, .. })
        ));

        let request = QuoteRequest {
            bedrooms: 6,
            ..Default::default()
        };
        assert!(request.validate().is_err());
        assert!("Triplex".parse::<Floors>().is_err());
    }

    #[test]
    fn test_quick_estimate() {
        let estimate = QuickEstimate {
            location: "Salem".to_owned(),
            size_sqft: 1200,
            budget: 2_500_000,
        };
        assert_eq!(estimate.estimated_cost(), 2_400_000);
        assert_eq!(
            estimate.summary().unwrap(),
            "Estimated cost for a 1200 sq.ft home in Salem is around ₹2,400,000*"
        );

        let too_small = QuickEstimate {
            size_sqft: 299,
            ..estimate.clone()
        };
        assert!(too_small.summary().is_err());

        let no_budget = QuickEstimate {
            budget: 99_999,
            ..estimate
        };
        assert!(matches!(
            no_budget.validate(),
            Err(FormError::OutOfRange { field: "budget", .. })
        ));
    }

    #[test]
    fn test_lead_form() {
        let form = LeadForm {
            name: "Ravi".to_owned(),
            phone: "9876543210".to_owned(),
            location: "Salem".to_owned(),
            sqft: 500,
            requirements: String::new(),
        };
        assert_eq!(form.submit(), Ok(LEAD_CAPTURED));

        let form = LeadForm {
            sqft: 10_001,
            ..form
        };
        assert!(form.submit().is_err());
    }

    #[test]
    fn test_group_thousands() {
        assert_eq!(group_thousands(0), "0");
        assert_eq!(group_thousands(999), "999");
        assert_eq!(group_thousands(1000), "1,000");
        assert_eq!(group_thousands(20_000_000), "20,000,000");
    }
}
