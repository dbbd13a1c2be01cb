//! API endpoint URL builders
//!
//! Every builder takes the versioned base from
//! [`OrgCredentials::data_base_url`](orgpush_common::OrgCredentials::data_base_url).

/// Build metadata deploy submission URL
pub fn deploy_request_url(base_url: &str) -> String {
    format!("{}/metadata/deployRequest", base_url)
}

/// Build metadata deploy status URL, component details included
pub fn deploy_status_url(base_url: &str, job_id: &str) -> String {
    format!(
        "{}/metadata/deployRequest/{}?includeDetails=true",
        base_url, job_id
    )
}

/// Build bulk ingest job creation URL
pub fn ingest_jobs_url(base_url: &str) -> String {
    format!("{}/jobs/ingest", base_url)
}

/// Build bulk ingest job URL (status and close)
pub fn ingest_job_url(base_url: &str, job_id: &str) -> String {
    format!("{}/jobs/ingest/{}", base_url, job_id)
}

/// Build bulk ingest CSV upload URL
pub fn ingest_batches_url(base_url: &str, job_id: &str) -> String {
    format!("{}/jobs/ingest/{}/batches", base_url, job_id)
}

pub fn successful_results_url(base_url: &str, job_id: &str) -> String {
    format!("{}/jobs/ingest/{}/successfulResults", base_url, job_id)
}

pub fn failed_results_url(base_url: &str, job_id: &str) -> String {
    format!("{}/jobs/ingest/{}/failedResults", base_url, job_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://example.my.salesforce.com/services/data/v61.0";

    #[test]
    fn test_deploy_urls() {
        assert_eq!(
            deploy_request_url(BASE),
            "https://example.my.salesforce.com/services/data/v61.0/metadata/deployRequest"
        );
        assert_eq!(
            deploy_status_url(BASE, "0Af123"),
            "https://example.my.salesforce.com/services/data/v61.0/metadata/deployRequest/0Af123?includeDetails=true"
        );
    }

    #[test]
    fn test_ingest_urls() {
        assert_eq!(
            ingest_jobs_url(BASE),
            "https://example.my.salesforce.com/services/data/v61.0/jobs/ingest"
        );
        assert_eq!(
            ingest_job_url(BASE, "750x"),
            "https://example.my.salesforce.com/services/data/v61.0/jobs/ingest/750x"
        );
        assert_eq!(
            ingest_batches_url(BASE, "750x"),
            "https://example.my.salesforce.com/services/data/v61.0/jobs/ingest/750x/batches"
        );
        assert!(successful_results_url(BASE, "750x").ends_with("/750x/successfulResults"));
        assert!(failed_results_url(BASE, "750x").ends_with("/750x/failedResults"));
    }
}
