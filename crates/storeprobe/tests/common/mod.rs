//! In-memory model of the demoblaze storefront for offline scenario runs.
//!
//! Navigations (category, product, cart, confirmation OK) re-render the page
//! synchronously. Everything the real site does over XHR (login modal, login
//! result, add-to-cart alert, cart row deletion, purchase confirmation) lands
//! a few observations later, so the scenarios' waits are exercised.

#![allow(dead_code)]

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use storeprobe::{
    Dialog, Locator, MockElement, MockLauncher, MockPage, SessionFixture, WaitOptions,
};

/// Base URL sessions open in tests
pub const STORE_URL: &str = "https://store.test/";

const CATALOG: &[(&str, &[&str])] = &[
    ("Phones", &["Samsung galaxy s6", "Nokia lumia 1520"]),
    ("Laptops", &["Sony vaio i5", "MacBook air"]),
    ("Monitors", &["Apple monitor 24"]),
];

#[derive(Debug, Default)]
struct StoreState {
    user: Option<String>,
    viewing: Option<String>,
    cart: Vec<String>,
}

type Shared = Arc<Mutex<StoreState>>;

fn state(shared: &Shared) -> MutexGuard<'_, StoreState> {
    shared.lock().unwrap_or_else(PoisonError::into_inner)
}

fn login_button() -> Locator {
    Locator::xpath("//button[text()='Log in']")
}

fn delete_link() -> Locator {
    Locator::xpath("//a[text()='Delete']")
}

fn place_order_button() -> Locator {
    Locator::xpath("//button[text()='Place Order']")
}

fn purchase_button() -> Locator {
    Locator::xpath("//button[text()='Purchase']")
}

fn ok_button() -> Locator {
    Locator::xpath("//button[text()='OK']")
}

const ORDER_FIELDS: [&str; 6] = ["name", "country", "city", "card", "month", "year"];

fn navbar(page: &mut MockPage, s: &StoreState) {
    page.insert(MockElement::new(Locator::id("login2"), "a").with_text("Log in"));
    page.insert(MockElement::new(Locator::id("cartur"), "a").with_text("Cart"));
    let welcome = MockElement::new(Locator::id("nameofuser"), "a");
    page.insert(match &s.user {
        Some(user) => welcome.with_text(format!("Welcome {user}")),
        None => welcome.hidden(),
    });
}

fn render_home(page: &mut MockPage, s: &StoreState) {
    page.clear();
    page.set_url(STORE_URL);
    navbar(page, s);
    for (category, products) in CATALOG {
        page.insert(MockElement::new(Locator::link_text(*category), "a").with_text(*category));
        for product in *products {
            page.insert(MockElement::new(Locator::link_text(*product), "a").with_text(*product));
        }
    }
}

fn render_category(page: &mut MockPage, s: &StoreState, category: &str) {
    page.clear();
    navbar(page, s);
    for (name, products) in CATALOG {
        page.insert(MockElement::new(Locator::link_text(*name), "a").with_text(*name));
        if *name == category {
            for product in *products {
                page.insert(MockElement::new(Locator::link_text(*product), "a").with_text(*product));
            }
        }
    }
}

fn render_product(page: &mut MockPage, s: &StoreState, product: &str) {
    page.clear();
    page.set_url(format!("{STORE_URL}prod.html"));
    navbar(page, s);
    page.insert(MockElement::new(Locator::class_name("name"), "h2").with_text(product));
    page.insert(MockElement::new(Locator::link_text("Add to cart"), "a").with_text("Add to cart"));
}

fn render_cart(page: &mut MockPage, s: &StoreState) {
    page.clear();
    page.set_url(format!("{STORE_URL}cart.html"));
    navbar(page, s);
    page.insert(MockElement::new(Locator::id("tbodyid"), "tbody").with_text(s.cart.join("\n")));
    for _ in &s.cart {
        page.insert(MockElement::new(delete_link(), "a").with_text("Delete"));
    }
    page.insert(MockElement::new(place_order_button(), "button").with_text("Place Order"));
}

/// Knobs for the storefront model
#[derive(Debug, Clone)]
pub struct StoreModel {
    accounts: Vec<(String, String)>,
    latency: u64,
    confirms_purchase: bool,
}

impl Default for StoreModel {
    fn default() -> Self {
        Self {
            accounts: vec![("gopi_test".to_string(), "test123".to_string())],
            latency: 2,
            confirms_purchase: true,
        }
    }
}

impl StoreModel {
    /// Observations before an asynchronous page update lands
    pub fn with_latency(mut self, latency: u64) -> Self {
        self.latency = latency;
        self
    }

    /// Register another account
    pub fn with_account(mut self, username: &str, password: &str) -> Self {
        self.accounts.push((username.to_string(), password.to_string()));
        self
    }

    /// Never show the purchase confirmation
    pub fn without_confirmation(mut self) -> Self {
        self.confirms_purchase = false;
        self
    }

    /// Launcher handing out a fresh store (empty cart, logged out) per session
    pub fn launcher(&self) -> MockLauncher {
        let model = self.clone();
        MockLauncher::new(move || model.page())
    }

    /// Fixture over this model with a short wait budget
    pub fn fixture(&self) -> SessionFixture<MockLauncher> {
        SessionFixture::new(self.launcher(), STORE_URL).with_wait(fast_wait())
    }

    /// A fresh page at the home screen
    pub fn page(&self) -> MockPage {
        let shared: Shared = Arc::default();
        let latency = self.latency;
        let mut page = MockPage::new();
        render_home(&mut page, &state(&shared));

        page.on_click(Locator::id("login2"), move |p| {
            p.after(latency, |p| {
                p.insert(MockElement::new(Locator::id("loginusername"), "input"));
                p.insert(MockElement::new(Locator::id("loginpassword"), "input"));
                p.insert(MockElement::new(login_button(), "button").with_text("Log in"));
            });
        });

        let s = Arc::clone(&shared);
        let accounts = self.accounts.clone();
        page.on_click(login_button(), move |p| {
            let user = p
                .value_of(&Locator::id("loginusername"))
                .unwrap_or_default()
                .to_string();
            let password = p
                .value_of(&Locator::id("loginpassword"))
                .unwrap_or_default()
                .to_string();
            let accepted = accounts.iter().any(|(u, pw)| *u == user && *pw == password);
            let s = Arc::clone(&s);
            p.after(latency, move |p| {
                if accepted {
                    let welcome = Locator::id("nameofuser");
                    p.set_text(&welcome, &format!("Welcome {user}"));
                    p.set_visible(&welcome, true);
                    state(&s).user = Some(user);
                } else {
                    p.open_dialog(Dialog::alert("User does not exist."));
                }
            });
        });

        for (category, products) in CATALOG {
            let s = Arc::clone(&shared);
            page.on_click(Locator::link_text(*category), move |p| {
                render_category(p, &state(&s), category);
            });
            for product in *products {
                let s = Arc::clone(&shared);
                page.on_click(Locator::link_text(*product), move |p| {
                    let mut st = state(&s);
                    st.viewing = Some((*product).to_string());
                    render_product(p, &st, product);
                });
            }
        }

        let s = Arc::clone(&shared);
        page.on_click(Locator::link_text("Add to cart"), move |p| {
            let s = Arc::clone(&s);
            p.after(latency, move |p| {
                let mut st = state(&s);
                if let Some(product) = st.viewing.clone() {
                    st.cart.push(product);
                }
                p.open_dialog(Dialog::alert("Product added."));
            });
        });

        let s = Arc::clone(&shared);
        page.on_click(Locator::id("cartur"), move |p| render_cart(p, &state(&s)));

        let s = Arc::clone(&shared);
        page.on_click(delete_link(), move |p| {
            let s = Arc::clone(&s);
            p.after(latency, move |p| {
                let mut st = state(&s);
                if !st.cart.is_empty() {
                    let _ = st.cart.remove(0);
                }
                render_cart(p, &st);
            });
        });

        page.on_click(place_order_button(), move |p| {
            p.after(latency, |p| {
                for field in ORDER_FIELDS {
                    p.insert(MockElement::new(Locator::id(field), "input"));
                }
                p.insert(MockElement::new(purchase_button(), "button").with_text("Purchase"));
            });
        });

        if self.confirms_purchase {
            page.on_click(purchase_button(), move |p| {
                let name = p.value_of(&Locator::id("name")).unwrap_or_default().to_string();
                let card = p.value_of(&Locator::id("card")).unwrap_or_default().to_string();
                p.after(latency, move |p| {
                    p.insert(
                        MockElement::new(Locator::class_name("sweet-alert"), "div").with_text(
                            format!("Thank you for your purchase!\nCard Number: {card}\nName: {name}"),
                        ),
                    );
                    p.insert(MockElement::new(ok_button(), "button").with_text("OK"));
                });
            });
        }

        let s = Arc::clone(&shared);
        page.on_click(ok_button(), move |p| {
            let mut st = state(&s);
            st.cart.clear();
            render_home(p, &st);
        });

        page
    }
}

/// Wait budget small enough for failing tests to finish quickly
pub fn fast_wait() -> WaitOptions {
    WaitOptions::new().with_timeout(500).with_poll_interval(5)
}

/// Text of the cart table body, if the cart page is shown
pub fn cart_text(page: &MockPage) -> Option<String> {
    page.element(&Locator::id("tbodyid")).map(|e| e.text.clone())
}
