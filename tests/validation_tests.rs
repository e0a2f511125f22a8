use notification_service::models::notification::NotificationRequest;

/// Test: a valid email request passes validation
#[test]
fn test_valid_email_request_passes() {
    let request = request("email", Some("user@example.com"), None, None);

    assert!(request.validate().is_ok());
}

/// Test: an email request without an address is rejected
#[test]
fn test_email_request_without_address_rejected() {
    let request = request("email", None, None, None);

    let error = request.validate().unwrap_err();
    assert_eq!(error.to_string(), "Please provide an email address.");
}

/// Test: an empty email address counts as missing
#[test]
fn test_email_request_with_empty_address_rejected() {
    let request = request("email", Some(""), None, None);

    assert!(request.validate().is_err());
}

/// Test: an sms request missing the phone number is rejected
#[test]
fn test_sms_request_without_phone_rejected() {
    let request = request("sms", None, None, Some("u1"));

    let error = request.validate().unwrap_err();
    assert_eq!(error.to_string(), "Phone and user ID are needed for SMS.");
}

/// Test: an sms request missing the user id is rejected
#[test]
fn test_sms_request_without_user_id_rejected() {
    let request = request("sms", None, Some("+15551234567"), None);

    assert!(request.validate().is_err());
}

/// Test: an sms request with both phone and user id passes
#[test]
fn test_sms_request_with_phone_and_user_id_passes() {
    let request = request("sms", None, Some("+15551234567"), Some("u1"));

    assert!(request.validate().is_ok());
}

/// Test: an in-app request with an empty user id is rejected
#[test]
fn test_in_app_request_with_empty_user_id_rejected() {
    let request = request("in_app", None, None, Some(""));

    let error = request.validate().unwrap_err();
    assert_eq!(
        error.to_string(),
        "User ID is required for in-app notifications."
    );
}

/// Test: an in-app request with a user id passes
#[test]
fn test_in_app_request_with_user_id_passes() {
    let request = request("in_app", None, None, Some("u1"));

    assert!(request.validate().is_ok());
}

/// Test: unrecognized types are not validated at ingress
#[test]
fn test_unrecognized_type_passes_validation() {
    let request = request("fax", None, None, None);

    assert!(request.validate().is_ok());
}

fn request(
    kind: &str,
    email: Option<&str>,
    phone: Option<&str>,
    user_id: Option<&str>,
) -> NotificationRequest {
    NotificationRequest {
        kind: kind.to_string(),
        message: "test message".to_string(),
        email: email.map(str::to_string),
        phone: phone.map(str::to_string),
        user_id: user_id.map(str::to_string),
    }
}
