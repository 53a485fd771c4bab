//! The demoblaze storefront: site identifiers and the five user journeys.
//!
//! ```text
//!  login_valid_user ─────────── login2 → credentials → Log in → "Welcome"
//!  login_invalid_user ───────── login2 → credentials → Log in → alert
//!  add_product_to_cart ──────── Laptops → Sony vaio i5 → Add to cart → alert → cart
//!  remove_product_from_cart ─── (add) → Delete → text gone
//!  place_order ──────────────── Phones → Samsung galaxy s6 → (add) → Place Order
//!                               → form → Purchase → sweet-alert → OK
//! ```

use serde::{Deserialize, Serialize};

use crate::locator::Locator;
use crate::scenario::{Scenario, Step};
use crate::wait::WaitCondition;

/// Public demo storefront
pub const BASE_URL: &str = "https://www.demoblaze.com/";

/// Marker the navbar shows once logged in
pub const WELCOME_MARKER: &str = "Welcome";

/// Alert text for a failed login
pub const LOGIN_REJECTED: &str = "User does not exist";

/// Heading of the order confirmation popup
pub const PURCHASE_CONFIRMED: &str = "Thank you for your purchase!";

/// Element locators used by the scenarios
pub mod locators {
    use crate::locator::Locator;

    /// Navbar "Log in" link
    #[must_use]
    pub fn login_link() -> Locator {
        Locator::id("login2")
    }

    /// Login modal username input
    #[must_use]
    pub fn username_input() -> Locator {
        Locator::id("loginusername")
    }

    /// Login modal password input
    #[must_use]
    pub fn password_input() -> Locator {
        Locator::id("loginpassword")
    }

    /// Login modal submit button
    #[must_use]
    pub fn login_button() -> Locator {
        Locator::xpath("//button[text()='Log in']")
    }

    /// Navbar welcome text
    #[must_use]
    pub fn welcome_label() -> Locator {
        Locator::id("nameofuser")
    }

    /// Navbar "Cart" link
    #[must_use]
    pub fn cart_link() -> Locator {
        Locator::id("cartur")
    }

    /// Cart table body
    #[must_use]
    pub fn cart_rows() -> Locator {
        Locator::id("tbodyid")
    }

    /// First "Delete" link in the cart
    #[must_use]
    pub fn delete_link() -> Locator {
        Locator::xpath("//a[text()='Delete']")
    }

    /// Cart "Place Order" button
    #[must_use]
    pub fn place_order_button() -> Locator {
        Locator::xpath("//button[text()='Place Order']")
    }

    /// Order modal "Purchase" button
    #[must_use]
    pub fn purchase_button() -> Locator {
        Locator::xpath("//button[text()='Purchase']")
    }

    /// Order confirmation popup
    #[must_use]
    pub fn confirmation_popup() -> Locator {
        Locator::class_name("sweet-alert")
    }

    /// Confirmation popup "OK" button
    #[must_use]
    pub fn confirmation_ok() -> Locator {
        Locator::xpath("//button[text()='OK']")
    }

    /// Product page "Add to cart" link
    #[must_use]
    pub fn add_to_cart() -> Locator {
        Locator::link_text("Add to cart")
    }

    /// Category or product link by its text
    #[must_use]
    pub fn link(text: &str) -> Locator {
        Locator::link_text(text)
    }
}

/// Values typed into the order modal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrderForm {
    /// Customer name
    pub name: String,
    /// Country
    pub country: String,
    /// City
    pub city: String,
    /// Credit card number
    pub card: String,
    /// Card expiry month
    pub month: String,
    /// Card expiry year
    pub year: String,
}

impl Default for OrderForm {
    fn default() -> Self {
        Self {
            name: "John Doe".to_string(),
            country: "USA".to_string(),
            city: "New York".to_string(),
            card: "1234567812345678".to_string(),
            month: "12".to_string(),
            year: "2025".to_string(),
        }
    }
}

impl OrderForm {
    fn fields(&self) -> [(Locator, &str); 6] {
        [
            (Locator::id("name"), self.name.as_str()),
            (Locator::id("country"), self.country.as_str()),
            (Locator::id("city"), self.city.as_str()),
            (Locator::id("card"), self.card.as_str()),
            (Locator::id("month"), self.month.as_str()),
            (Locator::id("year"), self.year.as_str()),
        ]
    }
}

/// Test data the scenarios type and expect
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorefrontData {
    /// Registered account name
    pub username: String,
    /// Its password
    pub password: String,
    /// A password that must be rejected
    pub wrong_password: String,
    /// Text the page must contain after a successful login.
    ///
    /// Defaults to "Welcome testuser", which does not match `username`; see
    /// DESIGN.md.
    pub expected_welcome: String,
    /// Category holding `laptop`
    pub laptop_category: String,
    /// Product added and removed in the cart scenarios
    pub laptop: String,
    /// Category holding `phone`
    pub phone_category: String,
    /// Product ordered in the checkout scenario
    pub phone: String,
    /// Order form contents
    pub order: OrderForm,
}

impl Default for StorefrontData {
    fn default() -> Self {
        Self {
            username: "gopi_test".to_string(),
            password: "test123".to_string(),
            wrong_password: "test1234".to_string(),
            expected_welcome: "Welcome testuser".to_string(),
            laptop_category: "Laptops".to_string(),
            laptop: "Sony vaio i5".to_string(),
            phone_category: "Phones".to_string(),
            phone: "Samsung galaxy s6".to_string(),
            order: OrderForm::default(),
        }
    }
}

impl StorefrontData {
    /// Set the expected welcome text
    #[must_use]
    pub fn with_expected_welcome(mut self, text: impl Into<String>) -> Self {
        self.expected_welcome = text.into();
        self
    }

    /// Set the account credentials
    #[must_use]
    pub fn with_credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = username.into();
        self.password = password.into();
        self
    }

    /// The welcome text the site renders for `username`
    #[must_use]
    pub fn welcome_for_username(&self) -> String {
        format!("{WELCOME_MARKER} {}", self.username)
    }
}

fn login_steps(username: &str, password: &str) -> Vec<Step> {
    vec![
        Step::click(locators::login_link()),
        Step::type_text(locators::username_input(), username),
        Step::type_now(locators::password_input(), password),
        Step::click_now(locators::login_button()),
    ]
}

fn add_to_cart_steps(category: &str, product: &str) -> Vec<Step> {
    vec![
        Step::click(locators::link(category)),
        Step::click(locators::link(product)),
        Step::click(locators::add_to_cart()),
        Step::wait(WaitCondition::alert()),
        Step::AcceptDialog,
        Step::click(locators::cart_link()),
    ]
}

/// Log in with valid credentials and see the welcome marker
#[must_use]
pub fn login_valid_user(data: &StorefrontData) -> Scenario {
    Scenario::new("login_valid_user")
        .describe("log in with valid credentials and see the welcome marker")
        .steps(login_steps(&data.username, &data.password))
        .step(Step::wait(WaitCondition::text_contains(
            locators::welcome_label(),
            WELCOME_MARKER,
        )))
        .step(Step::page_contains(&data.expected_welcome))
}

/// Log in with a wrong password and get rejected by a native alert
#[must_use]
pub fn login_invalid_user(data: &StorefrontData) -> Scenario {
    Scenario::new("login_invalid_user")
        .describe("log in with a wrong password and see the rejection alert")
        .steps(login_steps(&data.username, &data.wrong_password))
        .step(Step::wait(WaitCondition::alert()))
        .step(Step::dialog_contains(LOGIN_REJECTED))
        .step(Step::AcceptDialog)
}

/// Add a laptop and find it in the cart
#[must_use]
pub fn add_product_to_cart(data: &StorefrontData) -> Scenario {
    Scenario::new("add_product_to_cart")
        .describe("add a laptop and find it in the cart")
        .steps(add_to_cart_steps(&data.laptop_category, &data.laptop))
        .step(Step::page_contains(&data.laptop))
}

/// Add a laptop, delete it and see the cart without it
#[must_use]
pub fn remove_product_from_cart(data: &StorefrontData) -> Scenario {
    Scenario::new("remove_product_from_cart")
        .describe("add a laptop, delete it and see it gone from the cart")
        .steps(add_to_cart_steps(&data.laptop_category, &data.laptop))
        .step(Step::click(locators::delete_link()))
        .step(Step::wait(WaitCondition::text_absent(
            locators::cart_rows(),
            &data.laptop,
        )))
        .step(Step::page_lacks(&data.laptop))
}

/// Buy a phone through the order modal
#[must_use]
pub fn place_order(data: &StorefrontData) -> Scenario {
    let form = data.order.fields().into_iter().enumerate().map(|(i, (locator, value))| {
        if i == 0 {
            Step::type_text(locator, value)
        } else {
            Step::type_now(locator, value)
        }
    });

    Scenario::new("place_order")
        .describe("buy a phone and see the purchase confirmation")
        .steps(add_to_cart_steps(&data.phone_category, &data.phone))
        .step(Step::click(locators::place_order_button()))
        .steps(form)
        .step(Step::click_now(locators::purchase_button()))
        .step(Step::wait(WaitCondition::visible(locators::confirmation_popup())))
        .step(Step::page_contains(PURCHASE_CONFIRMED))
        .step(Step::click_now(locators::confirmation_ok()))
}

/// Every storefront scenario, in run order
#[must_use]
pub fn all(data: &StorefrontData) -> Vec<Scenario> {
    vec![
        login_valid_user(data),
        login_invalid_user(data),
        add_product_to_cart(data),
        remove_product_from_cart(data),
        place_order(data),
    ]
}
