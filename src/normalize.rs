use crate::extract::{extract_first, extract_raw};
use crate::models::NormalizedLead;
use serde_json::Value;

/// Source tag stamped on every lead produced by this integration.
pub const LEAD_SOURCE: &str = "linkedin";

// Candidate field paths per logical field, most specific first. The scraper
// actor has shipped several payload shapes over time; these lists cover the
// observed variants.
const TITLE_FIELDS: &[&str] = &["title", "jobTitle", "Title"];
const COMPANY_FIELDS: &[&str] = &["company.name", "companyName", "company"];
const URL_FIELDS: &[&str] = &["linkedinUrl", "linkedin_url", "url", "jobUrl", "link"];
const EXTERNAL_ID_FIELDS: &[&str] = &["id", "jobId", "externalId"];
const LOCATION_FIELDS: &[&str] = &["location.linkedinText", "location.parsed.text", "location"];
const SALARY_FIELDS: &[&str] = &["salary.text", "salary"];
const DESCRIPTION_FIELDS: &[&str] = &[
    "descriptionText",
    "description",
    "jobDescription",
    "descriptionHtml",
];
const POSTED_AT_FIELDS: &[&str] = &["postedAt", "postedDate", "listedAt"];
const RECRUITER_FIELDS: &[&str] = &[
    "recruiterName",
    "posterName",
    "poster.name",
    "jobPoster.name",
    "hiringTeam.0.name",
];
const COMPANY_URL_FIELDS: &[&str] = &["company.url", "companyUrl"];
const COMPANY_LINKEDIN_FIELDS: &[&str] = &["company.linkedinUrl", "companyLinkedinUrl"];
const COMPANY_DESCRIPTION_FIELDS: &[&str] = &["company.description", "companyDescription"];
const COMPANY_WEBSITE_FIELDS: &[&str] = &["company.website", "companyWebsite"];
const EMPLOYEE_COUNT_FIELDS: &[&str] = &["company.employeeCount", "employeeCount"];

/// Maps an employee count to its canonical size bucket.
///
/// Thresholds are inclusive upper bounds; zero or negative counts carry no
/// information and return `None`.
pub fn classify_employee_count(count: i64) -> Option<&'static str> {
    if count <= 0 {
        None
    } else if count <= 10 {
        Some("1-10")
    } else if count <= 50 {
        Some("11-50")
    } else if count <= 200 {
        Some("51-200")
    } else if count <= 500 {
        Some("201-500")
    } else {
        Some("501+")
    }
}

/// Buckets a raw company-size value that may be a count or free text.
///
/// Free text like "50-200" or "about 50 employees" is read as a lower-bound
/// estimate: the first numeric token wins. `None` is the explicit unknown
/// sentinel when no usable number is found. Total; never fails.
pub fn classify_company_size(value: &Value) -> Option<&'static str> {
    if let Some(count) = value.as_i64() {
        return classify_employee_count(count);
    }
    if let Some(count) = value.as_f64() {
        return classify_employee_count(count as i64);
    }
    if let Some(text) = value.as_str() {
        return leading_number(text).and_then(classify_employee_count);
    }
    None
}

/// First contiguous run of digits in a string, as an integer.
fn leading_number(text: &str) -> Option<i64> {
    let start = text.find(|c: char| c.is_ascii_digit())?;
    let digits: String = text[start..]
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}

/// Normalizes one raw job record from the scraper into a canonical lead.
///
/// Every field is extracted independently; partial data never aborts the
/// rest. The only rejection is a record with no resolvable URL and no
/// external id to synthesize one from: without an identifying URL the lead
/// could never be deduplicated.
pub fn normalize_job_record(record: &Value) -> Option<NormalizedLead> {
    let external_id = extract_first(record, EXTERNAL_ID_FIELDS);

    let url = extract_first(record, URL_FIELDS).or_else(|| {
        external_id
            .as_ref()
            .map(|id| format!("https://www.linkedin.com/jobs/view/{}/", id))
    })?;

    // A job with no title is still a valid lead; it must not be dropped.
    let title = extract_first(record, TITLE_FIELDS).unwrap_or_else(|| "Job".to_string());

    let company_size = extract_raw(record, EMPLOYEE_COUNT_FIELDS)
        .and_then(classify_company_size)
        .map(str::to_string);

    Some(NormalizedLead {
        title,
        company: extract_first(record, COMPANY_FIELDS),
        company_url: extract_first(record, COMPANY_URL_FIELDS),
        company_linkedin_url: extract_first(record, COMPANY_LINKEDIN_FIELDS),
        company_description: extract_first(record, COMPANY_DESCRIPTION_FIELDS),
        company_size,
        company_website: extract_first(record, COMPANY_WEBSITE_FIELDS),
        location: extract_first(record, LOCATION_FIELDS),
        salary: extract_first(record, SALARY_FIELDS),
        description: extract_first(record, DESCRIPTION_FIELDS),
        url,
        posted_at: extract_first(record, POSTED_AT_FIELDS),
        source: LEAD_SOURCE.to_string(),
        external_id,
        recruiter_name: extract_first(record, RECRUITER_FIELDS),
    })
}
