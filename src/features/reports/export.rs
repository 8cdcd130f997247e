use crate::features::reports::models::ReportRecord;

const CSV_HEADER: &str = "id,created_at,updated_at,status,severity,issue_type,description,address,latitude,longitude,assignee,owner_email,owner_display_name,photo_count\n";

fn escape_csv(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') || value.contains('\r')
    {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Render reports as CSV, one row per report in the given order.
///
/// Photos are summarized as a count; payloads are not exported.
pub fn reports_to_csv(records: &[ReportRecord]) -> String {
    let mut csv = String::from(CSV_HEADER);

    for record in records {
        let report = &record.report;
        let coordinates = report.location.coordinates();
        let latitude = coordinates
            .map(|c| c.latitude.to_string())
            .unwrap_or_default();
        let longitude = coordinates
            .map(|c| c.longitude.to_string())
            .unwrap_or_default();

        let fields = [
            report.id.to_string(),
            report.created_at.to_rfc3339(),
            report.updated_at.to_rfc3339(),
            report.status.to_string(),
            report.severity.to_string(),
            report.issue_type.to_string(),
            report.description.clone(),
            report.location.address().unwrap_or_default().to_string(),
            latitude,
            longitude,
            report.assignee.clone().unwrap_or_default(),
            record.owner.email.clone(),
            record.owner.display_name.clone().unwrap_or_default(),
            report.photos.len().to_string(),
        ];

        let row: Vec<String> = fields.iter().map(|f| escape_csv(f)).collect();
        csv.push_str(&row.join(","));
        csv.push('\n');
    }

    csv
}
