use crate::browser::driver::PageDriver;
use crate::browser::locator::Locator;
use crate::error::HarnessResult;
use crate::spec::spec_model::{FieldKey, FillProperties, PageTest, TestName};
use crate::vault::templates::CipherType;

pub const TEST_USER_NAME: &str = "bwplaywright";
pub const TEST_EMAIL: &str = "bwplaywright@example.com";

fn accept_iframe_prompt(page: &mut dyn PageDriver) -> HarnessResult<()> {
    page.accept_dialogs()
}

fn login_button(scope: Locator) -> Locator {
    scope.then_role("button", "Login").exact()
}

/// Pages served by the local fixture site, in run order.
///
/// `host` is the test-site host (`scheme://host[:port]`). Flags named
/// `shouldNot*` describe correct behavior; `skip` lists known failures.
pub fn builtin_pages(host: &str) -> Vec<PageTest> {
    let url = |path: &str| format!("{}{}", host, path);
    let search = |selector: &str, password_has_menu: bool| {
        let password = FillProperties::new(selector, "fakeSearchPassword").no_autofill();
        let password = if password_has_menu {
            password
        } else {
            password.no_inline_menu()
        };
        (
            FillProperties::new(selector, TEST_USER_NAME)
                .no_autofill()
                .no_inline_menu(),
            password,
        )
    };

    let (simple_search_user, simple_search_pass) = search("#search", true);
    let (inline_search_user, inline_search_pass) = search("#search", false);
    let (typeless_user, typeless_pass) = search("input.typeless-search-input", true);

    vec![
        PageTest::new(url("/forms/login/simple"))
            .input(FieldKey::Username, FillProperties::new("#username", TEST_USER_NAME))
            .input(FieldKey::Password, FillProperties::new("#password", "fakeBasicFormPassword")),
        PageTest::new(url("/forms/login/iframe-login"))
            .input(
                FieldKey::Username,
                FillProperties::new(Locator::frame("#test-iframe").then_css("#username"), TEST_USER_NAME)
                    .pre_fill_fn(accept_iframe_prompt),
            )
            .input(
                FieldKey::Password,
                FillProperties::new(
                    Locator::frame("#test-iframe").then_css("#password"),
                    "fakeIframeBasicFormPassword",
                ),
            )
            .submit_fn(|page| page.click(&login_button(Locator::frame("#test-iframe"))))
            // Works by hand; the inline menu inside the frame cannot be targeted
            .skip(&[TestName::InlineMenuAutofill]),
        PageTest::new(url("/forms/login/iframe-sandboxed-login"))
            .input(
                FieldKey::Username,
                FillProperties::new(Locator::frame("#test-iframe").then_css("#username"), TEST_USER_NAME)
                    .pre_fill_fn(accept_iframe_prompt),
            )
            .input(
                FieldKey::Password,
                FillProperties::new(
                    Locator::frame("#test-iframe").then_css("#password"),
                    "fakeSandboxedIframeBasicFormPassword",
                ),
            )
            .submit_fn(|page| page.click(&login_button(Locator::frame("#test-iframe"))))
            .skip(&[
                TestName::InlineMenuAutofill,
                TestName::MessageAutofill,
                TestName::NewCredentialsNotification,
                TestName::PasswordUpdateNotification,
            ]),
        PageTest::new(url("/forms/login/bare-inputs-login"))
            .input(FieldKey::Username, FillProperties::new("#username", TEST_USER_NAME))
            .input(FieldKey::Password, FillProperties::new("#password", "fakeBareInputsPassword"))
            .submit_fn(|page| page.click(&login_button(Locator::default()))),
        PageTest::new(url("/forms/login/hidden-login"))
            .input(
                FieldKey::Username,
                FillProperties::new("#username", TEST_USER_NAME)
                    .pre_fill_fn(|page| page.click(&Locator::role("button", "Show login").exact()))
                    .next(FieldKey::Email),
            )
            .input(
                FieldKey::Email,
                FillProperties::new("#email", TEST_EMAIL).next(FieldKey::Password),
            )
            .input(FieldKey::Password, FillProperties::new("#password", "fakeHiddenFormPassword"))
            .skip(&[
                TestName::MessageAutofill,
                TestName::NewCredentialsNotification,
                TestName::PasswordUpdateNotification,
            ]),
        PageTest::new(url("/forms/login/input-constraints-login"))
            .input(FieldKey::Username, FillProperties::new("#email", TEST_EMAIL))
            .input(FieldKey::Password, FillProperties::new("#password", "123456")),
        PageTest::new(url("/forms/login/login-honeypot"))
            .input(FieldKey::Username, FillProperties::new("#username", TEST_USER_NAME))
            .input(
                FieldKey::Code,
                FillProperties::new("input[name='honeypotCode']", "fakeLoginHoneypotCode")
                    .no_autofill()
                    .skip_entry(),
            )
            .input(
                FieldKey::NewPassword,
                FillProperties::new("input[name='honeypotPassword']", "fakeLoginHoneypotPassword")
                    .no_autofill()
                    .skip_entry(),
            )
            .input(
                FieldKey::Email,
                FillProperties::new("input[name='honeypotEmail']", "fakeLoginHoneypotEmail")
                    .no_autofill()
                    .skip_entry(),
            )
            .input(FieldKey::Password, FillProperties::new("#password", "fakeLoginHoneypotPassword")),
        PageTest::new(url("/forms/multi-step/email-username-login"))
            .input(
                FieldKey::Username,
                FillProperties::new("#username", TEST_USER_NAME).next(FieldKey::Email),
            )
            .input(
                FieldKey::Email,
                FillProperties::new("#email", TEST_EMAIL).next(FieldKey::Password),
            )
            .input(FieldKey::Password, FillProperties::new("#password", "fakeMultiStepPassword"))
            .skip(&[
                TestName::MessageAutofill,
                TestName::NewCredentialsNotification,
                TestName::PasswordUpdateNotification,
            ]),
        PageTest::new(url("/forms/login/shadow-root-inputs"))
            .input(
                FieldKey::Username,
                FillProperties::resolved(|_| Ok(Locator::label("Username")), TEST_USER_NAME),
            )
            .input(
                FieldKey::Password,
                FillProperties::resolved(
                    |_| Ok(Locator::label("Password")),
                    "fakeShadowRootInputsPassword",
                ),
            )
            .submit_fn(|page| page.click(&login_button(Locator::default()))),
        // A single full-name input stands in for every name part
        PageTest::new(url("/forms/identity/address-na"))
            .cipher(CipherType::Identity)
            .input(FieldKey::FirstName, FillProperties::new("#full-name", "John"))
            .input(FieldKey::MiddleName, FillProperties::new("#full-name", "M"))
            .input(FieldKey::LastName, FillProperties::new("#full-name", "Smith"))
            .input(FieldKey::Address1, FillProperties::new("#address", "123 Main St"))
            .input(FieldKey::Address2, FillProperties::new("#address-ext", "Apt 1"))
            .input(FieldKey::City, FillProperties::new("#city", "New York"))
            .input(FieldKey::State, FillProperties::new("#state", "NY"))
            .input(FieldKey::PostalCode, FillProperties::new("#postcode", "10001"))
            .input(FieldKey::Country, FillProperties::new("#country", "USA"))
            .skip(&[
                TestName::InlineMenuAutofill,
                TestName::MessageAutofill,
                TestName::NewCredentialsNotification,
                TestName::PasswordUpdateNotification,
            ]),
        PageTest::new(url("/forms/payment/card-payment"))
            .cipher(CipherType::Card)
            .input(FieldKey::CardholderName, FillProperties::new("#card-name", "John Smith"))
            .input(FieldKey::Number, FillProperties::new("#card-number", "4111111111111111"))
            .input(FieldKey::ExpMonth, FillProperties::new("#card-expiration", "12/25"))
            .input(FieldKey::Code, FillProperties::new("#card-cvv", "123"))
            .skip(&[
                TestName::MessageAutofill,
                TestName::NewCredentialsNotification,
                TestName::PasswordUpdateNotification,
            ]),
        PageTest::new(url("/forms/search/simple-search"))
            .input(FieldKey::Username, simple_search_user)
            .input(FieldKey::Password, simple_search_pass)
            .no_new_notification()
            .no_update_notification(),
        PageTest::new(url("/forms/search/inline-search"))
            .input(FieldKey::Username, inline_search_user)
            .input(FieldKey::Password, inline_search_pass)
            .no_new_notification()
            .no_update_notification(),
        PageTest::new(url("/forms/search/typeless-search"))
            .input(FieldKey::Username, typeless_user)
            .input(FieldKey::Password, typeless_pass)
            .submit_fn(|page| page.click(&Locator::role("button", "Go").exact()))
            .no_new_notification()
            .no_update_notification(),
        PageTest::new(url("/forms/update/update-email"))
            .input(
                FieldKey::Username,
                FillProperties::new("#email", format!("new{}", TEST_EMAIL)).no_autofill(),
            )
            .input(
                FieldKey::Password,
                FillProperties::new("#password", "fakeUpdateEmailPagePassword"),
            )
            .no_new_notification()
            .skip(&[
                TestName::NewCredentialsNotification,
                TestName::PasswordUpdateNotification,
                TestName::InlineMenuAutofill,
                TestName::MessageAutofill,
            ]),
        PageTest::new(url("/forms/update/update-password"))
            .input(
                FieldKey::Password,
                FillProperties::new("#currentPassword", "fakeUpdatePasswordPagePassword"),
            )
            .input(
                FieldKey::NewPassword,
                FillProperties::new("#newPassword", "newFakeUpdatePasswordPagePassword").no_autofill(),
            )
            .input(
                FieldKey::NewPasswordRetype,
                FillProperties::new("#newPasswordRetype", "newFakeUpdatePasswordPagePassword")
                    .no_autofill(),
            )
            .no_new_notification()
            .skip(&[TestName::MessageAutofill]),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::spec_model::validate_all;

    #[test]
    fn catalog_is_consistent() {
        let pages = builtin_pages("https://127.0.0.1:8443");
        assert_eq!(pages.len(), 16);
        validate_all(&pages).unwrap();
    }
}
