use url::Url;

const BRAND_NAME: &str = "SaaS Entrepreneur";
const ACCENT: &str = "#2563eb";
const DANGER: &str = "#dc2626";

/// Subject plus HTML and plain-text bodies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailTemplate {
    pub subject: String,
    pub html: String,
    pub text: String,
}

fn link(app_origin: &Url, path: &str) -> String {
    format!("{}{}", app_origin.as_str().trim_end_matches('/'), path)
}

fn greeting(name: Option<&str>) -> String {
    match name.map(str::trim).filter(|n| !n.is_empty()) {
        Some(name) => format!("Hi {name},"),
        None => "Hi there,".to_string(),
    }
}

fn button(url: &str, label: &str, color: &str) -> String {
    format!(
        r#"<p style="margin:20px 0;"><a href="{url}" style="background-color:{color};color:#ffffff;padding:10px 20px;text-decoration:none;border-radius:5px;">{label}</a></p>"#
    )
}

fn wrap_email(headline: &str, color: &str, greeting: &str, body_html: &str) -> String {
    format!(
        r#"<div style="font-family:Arial,sans-serif;max-width:600px;margin:0 auto;">
  <h1 style="color:{color};">{headline}</h1>
  <p>{greeting}</p>
  {body_html}
  <p>Best regards,<br>The {BRAND_NAME} Team</p>
</div>"#
    )
}

fn sign_off() -> String {
    format!("Best regards,\nThe {BRAND_NAME} Team")
}

pub fn welcome_email(name: Option<&str>) -> EmailTemplate {
    let hello = greeting(name);
    let body = format!(
        r#"<p>Thank you for joining {BRAND_NAME}! We're excited to have you on board.</p>
  <p>Here's what you can do next:</p>
  <ul>
    <li>Complete your profile setup</li>
    <li>Explore our dashboard features</li>
    <li>Check out our pricing plans</li>
  </ul>
  <p>If you have any questions, feel free to reach out to our support team.</p>"#
    );

    EmailTemplate {
        subject: format!("Welcome to {BRAND_NAME}!"),
        html: wrap_email(&format!("Welcome to {BRAND_NAME}!"), ACCENT, &hello, &body),
        text: format!(
            "Welcome to {BRAND_NAME}!\n\n{hello}\n\nThank you for joining {BRAND_NAME}! We're excited to have you on board.\n\n\
             Here's what you can do next:\n- Complete your profile setup\n- Explore our dashboard features\n- Check out our pricing plans\n\n\
             If you have any questions, feel free to reach out to our support team.\n\n{}",
            sign_off()
        ),
    }
}

pub fn subscription_confirmed_email(
    app_origin: &Url,
    name: Option<&str>,
    plan_name: &str,
) -> EmailTemplate {
    let hello = greeting(name);
    let dashboard = link(app_origin, "/dashboard");
    let body = format!(
        r#"<p>Your subscription to the <strong>{plan_name}</strong> plan has been confirmed.</p>
  <p>You now have access to all the features included in your plan.</p>
  <p>Visit your dashboard to get started:</p>
  {}"#,
        button(&dashboard, "Go to Dashboard", ACCENT)
    );

    EmailTemplate {
        subject: "Subscription Confirmed".to_string(),
        html: wrap_email("Subscription Confirmed!", ACCENT, &hello, &body),
        text: format!(
            "Subscription Confirmed!\n\n{hello}\n\nYour subscription to the {plan_name} plan has been confirmed.\n\n\
             You now have access to all the features included in your plan.\n\n\
             Visit your dashboard to get started:\n{dashboard}\n\n{}",
            sign_off()
        ),
    }
}

pub fn payment_failed_email(app_origin: &Url, name: Option<&str>) -> EmailTemplate {
    let hello = greeting(name);
    let settings = link(app_origin, "/settings");
    let body = format!(
        r#"<p>We were unable to process your payment. Your subscription may be affected.</p>
  <p>Please update your payment method to continue using our services:</p>
  {}
  <p>If you need help, please contact our support team.</p>"#,
        button(&settings, "Update Payment Method", DANGER)
    );

    EmailTemplate {
        subject: "Payment Failed - Action Required".to_string(),
        html: wrap_email("Payment Failed", DANGER, &hello, &body),
        text: format!(
            "Payment Failed\n\n{hello}\n\nWe were unable to process your payment. Your subscription may be affected.\n\n\
             Please update your payment method to continue using our services:\n{settings}\n\n\
             If you need help, please contact our support team.\n\n{}",
            sign_off()
        ),
    }
}
