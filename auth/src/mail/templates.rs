use super::OutgoingEmail;

pub const VERIFICATION_SUBJECT: &str = "Verify your email address";

const LOGO_URL: &str = "https://callbackpdfphotobucket.s3.ap-southeast-1.amazonaws.com/blacklogo.png";
const ICON_URL: &str = "https://callbackpdfphotobucket.s3.ap-southeast-1.amazonaws.com/callbackemailicon.png";
const SUPPORT_EMAIL: &str = "support@callback.ph";

fn escape_html(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Builds the magic-link email addressed to `first_name`.
pub fn verification_email(to: &str, first_name: &str, url: &str) -> OutgoingEmail {
    let name = escape_html(first_name);
    let link = escape_html(url);

    let html = format!(
        r#"<div style="align-items: center; padding: 1.25rem; max-width: 600px; margin: 0 auto;">
    <div style="margin-bottom: 1rem; text-align: center">
        <img src="{logo}" alt="image" style="width: 100px; margin-bottom: 1.5rem;" />
    </div>
    <div style="text-align: center; color: black;">
        <h1 style="font-size: 1.5rem; font-weight: bold; margin-bottom: 0.5rem;">Hello {name}, </h1>
        <p style="font-size: 0.75rem; font-weight: bold;">Welcome to Callback!</p>
    </div>
    <div style="margin-bottom: 1rem; text-align: center">
        <img src="{icon}" alt="image" style="width: 200px; margin-bottom: 1.5rem;" />
    </div>
    <div style="text-align: center; color: black;">
        <h1 style="font-size: 1rem; font-weight: bold; margin-bottom: 0.5rem;">You’re almost there!</h1>
        <p style="font-size: 0.75rem; font-weight: bold;">simply click the button below to sign in:</p>
        <a href="{link}" style="font-size: 1rem; background-color: #F5E809; color: black; border-radius: 9999px; padding: 0.75rem 1.125rem; text-decoration: none; display: inline-block; margin-top: 1.5rem;">Verify Email</a>
    </div>
    <div style="background-color: #f3f4f6; width: 100%; text-align: center; padding: 1rem 1.5rem; margin-top: 1.5rem;">
        <p style="font-weight: bold; font-size: 1rem">Or try using this link:</p>
        <a href="{link}" style="text-decoration: none; color: inherit; word-break: break-word; font-size: 0.8rem;">{link}</a>
    </div>

    <hr style="width: 100%; margin-top: 15px; margin-left: auto; margin-right: auto;">

    <div style="font-size: 1rem; width: 100%; margin-top: 1.5rem; text-align: center; color: gray;">
        <p style="font-weight: bold;">Need assistance Contact our support team:</p>
        <p style="text-decoration: none;">{support}</p>
    </div>
</div>
"#,
        logo = LOGO_URL,
        icon = ICON_URL,
        name = name,
        link = link,
        support = SUPPORT_EMAIL,
    );

    let text = format!(
        "Hello {first_name},\n\nWelcome to Callback!\n\nYou’re almost there! Open the link below to sign in:\n\n{url}\n\nNeed assistance? Contact our support team: {support}\n",
        first_name = first_name,
        url = url,
        support = SUPPORT_EMAIL,
    );

    OutgoingEmail {
        to: to.to_string(),
        subject: VERIFICATION_SUBJECT.to_string(),
        text,
        html,
    }
}
