use crate::books::dto::{BookForm, ImageUpload};
use crate::core::domain::Configuration;
use crate::core::library::FieldViolations;

const ALLOWED_IMAGE_TYPES: [&str; 3] = ["jpeg", "jpg", "png"];

// Create keeps isbn/writer/category/page_amount/stock_amount optional;
// Update requires every scalar field but leaves the image part optional
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ValidationMode {
    Create,
    Update,
}

// ValidatedBook holds the typed field values once every rule has passed
#[derive(Debug, Clone)]
pub struct ValidatedBook {
    pub title: String,
    pub synopsis: String,
    pub published: String,
    pub isbn: Option<String>,
    pub writer: Option<String>,
    pub category: Option<String>,
    pub page_amount: Option<i64>,
    pub stock_amount: Option<i64>,
    pub image_extension: Option<String>,
}

// Runs every rule and returns the full set of violations, not just the
// first. `title_owner` is the id of the row currently holding the title,
// if any; `exempt_id` excludes the row being updated from that check.
pub fn validate_book(form: &BookForm, image: Option<&ImageUpload>,
                     config: &Configuration, mode: ValidationMode,
                     title_owner: Option<&str>,
                     exempt_id: Option<&str>) -> Result<ValidatedBook, FieldViolations> {
    let mut violations = FieldViolations::new();

    let title = required_string("title", &form.title, &mut violations);
    if let Some(owner) = title_owner {
        if exempt_id != Some(owner) {
            add_violation(&mut violations, "title", "The title has already been taken.");
        }
    }
    let synopsis = required_string("synopsis", &form.synopsis, &mut violations);
    let published = required_string("published", &form.published, &mut violations);

    let (isbn, writer, category) = match mode {
        ValidationMode::Create => (
            optional_string(&form.isbn),
            optional_string(&form.writer),
            optional_string(&form.category),
        ),
        ValidationMode::Update => (
            required_string("isbn", &form.isbn, &mut violations),
            required_string("writer", &form.writer, &mut violations),
            required_string("category", &form.category, &mut violations),
        ),
    };
    let page_amount = integer_field("page_amount", &form.page_amount, mode, &mut violations);
    let stock_amount = integer_field("stock_amount", &form.stock_amount, mode, &mut violations);

    let image_extension = validate_image(image, config, mode, &mut violations);

    if violations.is_empty() {
        Ok(ValidatedBook {
            title: title.unwrap_or_default(),
            synopsis: synopsis.unwrap_or_default(),
            published: published.unwrap_or_default(),
            isbn,
            writer,
            category,
            page_amount,
            stock_amount,
            image_extension,
        })
    } else {
        Err(violations)
    }
}

fn validate_image(image: Option<&ImageUpload>, config: &Configuration,
                  mode: ValidationMode, violations: &mut FieldViolations) -> Option<String> {
    let image = match image {
        Some(image) => image,
        None => {
            if mode == ValidationMode::Create {
                add_violation(violations, "image", "The image field is required.");
            }
            return None;
        }
    };

    let extension = image.extension().filter(|ext| {
        ALLOWED_IMAGE_TYPES.contains(&ext.as_str())
    });
    match extension {
        Some(ref ext) => {
            if !matches_magic_bytes(ext.as_str(), image.bytes.as_slice()) {
                add_violation(violations, "image",
                              "The image must be a file of type: jpeg, jpg, png.");
            }
        }
        None => {
            add_violation(violations, "image",
                          "The image must be a file of type: jpeg, jpg, png.");
        }
    }
    if image.bytes.len() > config.max_image_kb * 1024 {
        add_violation(violations, "image",
                      format!("The image may not be greater than {} kilobytes.",
                              config.max_image_kb).as_str());
    }
    extension
}

// uploaded bytes must carry the signature of the claimed type, so a
// renamed gif cannot slip through on extension alone
fn matches_magic_bytes(extension: &str, bytes: &[u8]) -> bool {
    match extension {
        "jpeg" | "jpg" => bytes.starts_with(&[0xff, 0xd8, 0xff]),
        "png" => bytes.starts_with(&[0x89, 0x50, 0x4e, 0x47, 0x0d, 0x0a, 0x1a, 0x0a]),
        _ => false,
    }
}

fn required_string(field: &str, value: &Option<String>,
                   violations: &mut FieldViolations) -> Option<String> {
    match optional_string(value) {
        Some(val) => Some(val),
        None => {
            add_violation(violations, field,
                          format!("The {} field is required.", label(field)).as_str());
            None
        }
    }
}

fn optional_string(value: &Option<String>) -> Option<String> {
    value.as_ref()
        .map(|val| val.trim())
        .filter(|val| !val.is_empty())
        .map(str::to_string)
}

fn integer_field(field: &str, value: &Option<String>, mode: ValidationMode,
                 violations: &mut FieldViolations) -> Option<i64> {
    let raw = match optional_string(value) {
        Some(raw) => raw,
        None => {
            if mode == ValidationMode::Update {
                add_violation(violations, field,
                              format!("The {} field is required.", label(field)).as_str());
            }
            return None;
        }
    };
    match raw.parse::<i64>() {
        Ok(n) if n >= 0 => Some(n),
        Ok(_) => {
            add_violation(violations, field,
                          format!("The {} must be at least 0.", label(field)).as_str());
            None
        }
        Err(_) => {
            add_violation(violations, field,
                          format!("The {} must be an integer.", label(field)).as_str());
            None
        }
    }
}

fn label(field: &str) -> String {
    field.replace('_', " ")
}

fn add_violation(violations: &mut FieldViolations, field: &str, message: &str) {
    violations.entry(field.to_string()).or_default().push(message.to_string());
}
