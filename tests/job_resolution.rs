//! Job name construction and job finder resolution

use xmake_lane::job::{
    find_job, parse_matches, resolve_job, JobError, JobLocation, JobNameRequest, LookupError,
    DEFAULT_LEGACY_TEMPLATE,
};
use xmake_lane::mock::StaticJobFinder;
use xmake_lane::summary::ErrorCategory;

fn request(quality: &str, shipment: &str) -> JobNameRequest {
    JobNameRequest {
        owner: "ppiper".to_string(),
        repository: "app".to_string(),
        quality: quality.to_string(),
        shipment_type: shipment.to_string(),
        pattern: "GitHub-Internal".to_string(),
        ..Default::default()
    }
}

fn located(full_name: &str, landscape: &str) -> JobLocation {
    JobLocation {
        name: full_name.rsplit('/').next().unwrap().to_string(),
        full_name: full_name.to_string(),
        url: format!("https://{}.example/job/{}/", landscape, full_name.replace('/', "/job/")),
        landscape: landscape.to_string(),
        jenkins_url: format!("https://{}.example", landscape),
        branch: String::new(),
    }
}

#[test]
fn test_legacy_job_name_selects_tools_landscape() {
    let finder = StaticJobFinder::new();
    let mut req = request("Milestone", "");
    req.legacy_job_name = "ght-anything".to_string();

    let _ = resolve_job(&finder, &req);

    assert_eq!(finder.looked_up(), vec!["ght-ppiper-app-SP-MS-common".to_string()]);
}

#[test]
fn test_default_legacy_template_is_ignored() {
    let finder = StaticJobFinder::new();
    let mut req = request("Milestone", "");
    req.pattern = "GitHub-Tools".to_string();
    req.legacy_job_name_template = DEFAULT_LEGACY_TEMPLATE.to_string();

    let _ = resolve_job(&finder, &req);

    assert_eq!(finder.looked_up(), vec!["ght-ppiper-app-SP-MS-common".to_string()]);
}

#[test]
fn test_release_with_shipment_resolves_last_candidate() {
    let name = "ppiper-app-SP-REL-common_cloud";
    let finder = StaticJobFinder::new().with_job(
        name,
        vec![
            located(&format!("ppiper/{}", name), "canary"),
            located(&format!("ppiper/{}", name), "prod"),
        ],
    );

    let identity = resolve_job(&finder, &request("Release", "cloud")).unwrap();

    assert_eq!(identity.name(), name);
    assert_eq!(identity.candidates().len(), 2);
    assert_eq!(identity.selected().landscape, "prod");
    assert_eq!(identity.selected().jenkins_url, "https://prod.example");
}

#[test]
fn test_no_candidates_is_configuration_error() {
    let finder = StaticJobFinder::new();

    let err = find_job(&finder, "ppiper-app-SP-MS-common").unwrap_err();

    assert!(matches!(err, JobError::NotFound(_)));
    assert_eq!(err.category(), ErrorCategory::Configuration);
    assert_eq!(err.to_string(), "no jobs found with name 'ppiper-app-SP-MS-common'");
}

#[test]
fn test_lookup_failures_are_infrastructure() {
    let errors = vec![
        LookupError::NoResponse("connection reset".to_string()),
        LookupError::from_status(503, "Service Unavailable"),
        LookupError::from_status(401, "Unauthorized"),
        LookupError::from_status(302, "Found"),
        LookupError::Decode("expected value".to_string()),
    ];

    for error in errors {
        let finder = StaticJobFinder::new().failing(error);
        let err = find_job(&finder, "x").unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Infrastructure, "{}", err);
    }
}

#[test]
fn test_status_classification_messages() {
    assert_eq!(
        LookupError::from_status(503, "Service Unavailable").to_string(),
        "Jenkins server error: service unavailable. HTTP Status: 503. Error: Service Unavailable"
    );
    assert!(matches!(LookupError::from_status(404, "Not Found"), LookupError::ClientError(404, _)));
    assert_eq!(LookupError::from_status(302, "Found"), LookupError::UnexpectedStatus(302));
}

#[test]
fn test_invalid_naming_inputs_skip_lookup() {
    let finder = StaticJobFinder::new();
    let mut req = request("Milestone", "");
    req.owner.clear();

    let err = resolve_job(&finder, &req).unwrap_err();

    assert_eq!(err.category(), ErrorCategory::Configuration);
    assert_eq!(err.to_string(), "failed to construct job name: owner not set");
    assert_eq!(finder.lookups(), 0);
}

#[test]
fn test_parse_finder_response() {
    let body = br#"{"job":[{"name":"ppiper-app-SP-MS-common","fullName":"ppiper/ppiper-app-SP-MS-common",
        "url":"https://j/job/ppiper/job/ppiper-app-SP-MS-common/","landscape":"prod",
        "jenkinsUrl":"https://j","branch":"main"}]}"#;

    let jobs = parse_matches(body).unwrap();
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0].full_name, "ppiper/ppiper-app-SP-MS-common");
    assert_eq!(jobs[0].jenkins_url, "https://j");

    assert!(parse_matches(br#"{"job":null}"#).unwrap().is_empty());
    assert!(matches!(parse_matches(b"<html>"), Err(LookupError::Decode(_))));
}
