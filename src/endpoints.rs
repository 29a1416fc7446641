use crate::api::{self, fields, Item};
use crate::auth;
use crate::basket::Basket;
use crate::errors::{BoxedError, Error, Result};
use crate::http::{Request, Response};
use crate::orders::{self, Ledger, OrderStore};
use crate::routes::*;
use crate::session::{self, Session, SessionStore};

/// Everything the handlers need besides the request, created once at startup
pub struct Services {
    pub sessions: Box<dyn SessionStore>,
    pub orders: Box<dyn OrderStore>,
}

impl Services {
    pub fn new(sessions: Box<dyn SessionStore>, orders: Box<dyn OrderStore>) -> Services {
        Services { sessions, orders }
    }

    /// Services keeping everything in memory
    #[cfg(test)]
    pub(crate) fn in_memory() -> Services {
        Services::new(
            Box::new(session::memory::MemorySessionStore::new()),
            Box::new(orders::mock::MemoryOrderStore::new()),
        )
    }
}

pub fn create_http_router() -> Result<HttpRouter> {
    let mut router = HttpRouter::new()?;

    router.add_route("POST", endpoints::LOGIN, login);
    router.add_route("POST", endpoints::BASKET_ADD, basket_add);
    router.add_route("POST", endpoints::BASKET_EMPTY, basket_empty);
    router.add_route("POST", endpoints::BASKET_REMOVE, basket_remove);
    router.add_route("POST", endpoints::BASKET_SUBMIT, basket_submit);
    router.add_route("GET", endpoints::ORDER_VIEW, get_basket);
    router.add_route("GET", endpoints::ORDERS, get_pending_orders);
    router.add_route("GET", endpoints::ORDERS_COMPLETED, get_completed_orders);
    router.add_route("POST", endpoints::ORDER_COMPLETE, order_complete);

    Ok(router)
}

/// Route a request and turn handler failures into HTTP errors
pub fn handle(router: &HttpRouter, services: &Services, request: Request) -> Response {
    let method = request.method.clone();
    let path = request.path.clone();
    log::debug!("{} {}", method, path);

    match router.route(request, services) {
        Ok(response) => response,
        Err(err) => error_response(&method, &path, err),
    }
}

fn error_response(method: &str, path: &str, err: BoxedError) -> Response {
    match err.downcast_ref::<Error>() {
        Some(error) if error.status() < 500 => {
            log::warn!("{} {}: {}", method, path, error);
            Response::client_error(error.status(), &error.to_string())
        }
        _ => {
            log::error!("{} {}: {}", method, path, err);
            Response::internal_server_error()
        }
    }
}

/// Redirect, keeping the client attached to its session
fn redirect(session: &Session, location: &str) -> Response {
    Response::redirect(location).with_header("Set-Cookie", &session.cookie())
}

fn valid_rest_link(rest_link: &str) -> Result<&str> {
    if api::is_valid_rest_link(rest_link) {
        Ok(rest_link)
    } else {
        Err(Error::BadRequest(format!("Invalid restaurant link {:?}", rest_link)).into())
    }
}

fn login(request: Request, _: HttpParams, services: &Services) -> Result<Response> {
    let mut session = session::from_request(services.sessions.as_ref(), &request)?;
    let form = request.form()?;

    let user_name = form.required(fields::USERNAME)?.trim();
    if user_name.is_empty() {
        return Err(Error::FormDecode("empty user name".to_string()).into());
    }
    let rest_link = form
        .get(fields::REST_LINK)
        .filter(|link| !link.is_empty())
        .map(valid_rest_link)
        .transpose()?;

    auth::login(&mut session, user_name, rest_link)?;
    session::save(services.sessions.as_ref(), &session)?;
    log::info!("{} logged in (restaurant: {:?})", user_name, rest_link);

    let location = if rest_link.is_some() { paths::ORDERS } else { HOME };
    Ok(redirect(&session, location))
}

fn basket_add(request: Request, _: HttpParams, services: &Services) -> Result<Response> {
    let mut session = session::from_request(services.sessions.as_ref(), &request)?;
    if !auth::is_authenticated(&session) {
        return Ok(Response::redirect(paths::LOGIN));
    }

    let form = request.form()?;
    let rest_link = valid_rest_link(form.required(fields::REST_LINK)?)?;
    let item = Item::from_form(&form)?;

    let mut basket = match session.basket()? {
        Some(basket) => basket,
        None => Basket::new(rest_link, &auth::user_name(&session)?),
    };
    basket.add(rest_link, item);

    session.set_basket(&basket)?;
    session::save(services.sessions.as_ref(), &session)?;
    Ok(redirect(&session, &order_view(rest_link)))
}

fn basket_empty(request: Request, _: HttpParams, services: &Services) -> Result<Response> {
    let mut session = session::from_request(services.sessions.as_ref(), &request)?;

    let mut basket = match session.basket()? {
        Some(basket) => basket,
        None => return Ok(redirect(&session, HOME)),
    };
    basket.empty();

    session.set_basket(&basket)?;
    session::save(services.sessions.as_ref(), &session)?;
    Ok(redirect(&session, &order_view(&basket.rest_link)))
}

fn basket_remove(request: Request, _: HttpParams, services: &Services) -> Result<Response> {
    let mut session = session::from_request(services.sessions.as_ref(), &request)?;
    let item = Item::from_form(&request.form()?)?;

    let mut basket = session
        .basket()?
        .ok_or_else(|| Error::BadRequest("No basket in this session".to_string()))?;
    basket.remove(&item);

    session.set_basket(&basket)?;
    session::save(services.sessions.as_ref(), &session)?;
    Ok(redirect(&session, &order_view(&basket.rest_link)))
}

fn basket_submit(request: Request, _: HttpParams, services: &Services) -> Result<Response> {
    let mut session = session::from_request(services.sessions.as_ref(), &request)?;

    let mut basket = session
        .basket()?
        .ok_or_else(|| Error::BadRequest("No basket in this session".to_string()))?;
    orders::submit_order(services.orders.as_ref(), &mut basket)?;

    session.set_basket(&basket)?;
    session::save(services.sessions.as_ref(), &session)?;
    Ok(redirect(&session, &order_view(&basket.rest_link)))
}

fn get_basket(request: Request, route_params: HttpParams, services: &Services) -> Result<Response> {
    let session = session::from_request(services.sessions.as_ref(), &request)?;
    let rest_link = route_params
        .get(params::REST_LINK)
        .ok_or(Error::BadRequest("Missing restaurant link".to_string()))?;

    let basket = match session.basket()? {
        Some(basket) => basket,
        None => Basket::new(rest_link, &auth::user_name(&session)?),
    };
    Ok(Response::json(&basket)?.with_header("Set-Cookie", &session.cookie()))
}

/// Orders of the restaurant the logged in user works for
fn list_orders(request: Request, services: &Services, ledger: Ledger) -> Result<Response> {
    let session = session::from_request(services.sessions.as_ref(), &request)?;
    let rest_link = match auth::restaurant_link(&session)? {
        Some(rest_link) => rest_link,
        None => return Ok(Response::redirect(paths::LOGIN)),
    };

    let orders = services.orders.load(&rest_link, ledger)?;
    Ok(Response::json(&orders)?.with_header("Set-Cookie", &session.cookie()))
}

fn get_pending_orders(request: Request, _: HttpParams, services: &Services) -> Result<Response> {
    list_orders(request, services, Ledger::Pending)
}

fn get_completed_orders(request: Request, _: HttpParams, services: &Services) -> Result<Response> {
    list_orders(request, services, Ledger::Completed)
}

fn order_complete(request: Request, _: HttpParams, services: &Services) -> Result<Response> {
    let session = session::from_request(services.sessions.as_ref(), &request)?;
    let rest_link = match auth::restaurant_link(&session)? {
        Some(rest_link) => rest_link,
        None => return Ok(Response::redirect(paths::LOGIN)),
    };

    let index = api::index_from_form(&request.form()?)?;
    orders::complete_order(services.orders.as_ref(), &rest_link, index)?;
    Ok(redirect(&session, paths::ORDERS))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::Order;
    use crate::http::{client::session_from_response, FORM_CONTENT_TYPE};
    use std::collections::BTreeMap;

    /// Drives the router the way a browser would, carrying the session cookie along
    struct Browser {
        router: HttpRouter,
        services: Services,
        session: Option<String>,
    }

    impl Browser {
        fn new() -> Browser {
            Browser {
                router: create_http_router().unwrap(),
                services: Services::in_memory(),
                session: None,
            }
        }

        fn request(&mut self, method: &str, path: &str, form: &str) -> Response {
            let mut request = Request::new(method, path, vec![], form.to_string())
                .with_header("Content-Type", FORM_CONTENT_TYPE);
            if let Some(session) = &self.session {
                request = request.with_header("Cookie", &format!("session={}", session));
            }
            let response = handle(&self.router, &self.services, request);
            if let Some(session) = session_from_response(&response) {
                self.session = Some(session);
            }
            response
        }

        fn post(&mut self, path: &str, form: &str) -> Response {
            self.request("POST", path, form)
        }

        fn get(&mut self, path: &str) -> Response {
            self.request("GET", path, "")
        }

        fn basket(&mut self) -> Basket {
            let response = self.get("/order/any");
            assert_eq!(response.status, Some(200));
            serde_json::from_str(&response.body).unwrap()
        }

        fn orders(&mut self, path: &str) -> Vec<Order> {
            let response = self.get(path);
            assert_eq!(response.status, Some(200), "{}", response.body);
            serde_json::from_str(&response.body).unwrap()
        }
    }

    const BURGER: &str = "restLink=burger-joint&itemName=Burger&itemPrice=5.00&itemLink=burger";
    const FRIES: &str = "restLink=burger-joint&itemName=Fries&itemPrice=2.50&itemLink=fries";

    fn assert_redirect(response: &Response, location: &str) {
        assert_eq!(response.status, Some(302), "{}", response.body);
        assert_eq!(response.header("Location"), Some(location));
    }

    #[test]
    fn test_add_requires_login() {
        let mut browser = Browser::new();
        let response = browser.post(paths::BASKET_ADD, BURGER);
        assert_redirect(&response, paths::LOGIN);
        assert!(response.header("Set-Cookie").is_none());
    }

    #[test]
    fn test_basket_flow() {
        let mut browser = Browser::new();
        assert_redirect(&browser.post(paths::LOGIN, "username=alice"), HOME);

        assert_redirect(
            &browser.post(paths::BASKET_ADD, BURGER),
            "/order/burger-joint",
        );
        browser.post(paths::BASKET_ADD, BURGER);
        browser.post(paths::BASKET_ADD, FRIES);

        let basket = browser.basket();
        assert_eq!(basket.rest_link, "burger-joint");
        assert_eq!(basket.user_name, "alice");
        assert_eq!(basket.total_amount, "12.50");
        assert_eq!(basket.items[&Item::new("Burger", "5.00", "burger")], 2);

        assert_redirect(
            &browser.post(paths::BASKET_REMOVE, BURGER),
            "/order/burger-joint",
        );
        assert_eq!(browser.basket().total_amount, "7.50");

        assert_redirect(&browser.post(paths::BASKET_EMPTY, ""), "/order/burger-joint");
        let basket = browser.basket();
        assert!(basket.is_empty());
        assert_eq!(basket.total_amount, "0.00");
        assert_eq!(basket.rest_link, "burger-joint");
    }

    #[test]
    fn test_remove_everything_then_submit() {
        let mut browser = Browser::new();
        browser.post(paths::LOGIN, "username=alice");
        browser.post(paths::BASKET_ADD, FRIES);
        browser.post(paths::BASKET_REMOVE, FRIES);

        let basket = browser.basket();
        assert!(basket.is_empty());
        assert_eq!(basket.total_amount, "0.00");

        assert_redirect(
            &browser.post(paths::BASKET_SUBMIT, ""),
            "/order/burger-joint",
        );
        let pending = browser
            .services
            .orders
            .load("burger-joint", Ledger::Pending)
            .unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].total_amount, "0.00");
        assert!(pending[0].items_info.is_empty());
    }

    #[test]
    fn test_empty_without_basket() {
        let mut browser = Browser::new();
        let response = browser.post(paths::BASKET_EMPTY, "");
        assert_redirect(&response, HOME);
        assert!(response.header("Set-Cookie").is_some());
    }

    #[test]
    fn test_switching_restaurant() {
        let mut browser = Browser::new();
        browser.post(paths::LOGIN, "username=alice");
        browser.post(paths::BASKET_ADD, BURGER);

        assert_redirect(
            &browser.post(
                paths::BASKET_ADD,
                "restLink=noodle-bar&itemName=Ramen&itemPrice=8.00&itemLink=ramen",
            ),
            "/order/noodle-bar",
        );

        let basket = browser.basket();
        assert_eq!(basket.rest_link, "noodle-bar");
        assert_eq!(basket.items.len(), 1);
        assert_eq!(basket.total_amount, "8.00");
    }

    #[test]
    fn test_submit_and_complete() {
        let mut browser = Browser::new();
        browser.post(paths::LOGIN, "username=alice");
        browser.post(paths::BASKET_ADD, BURGER);
        browser.post(paths::BASKET_ADD, BURGER);
        browser.post(paths::BASKET_ADD, FRIES);

        assert_redirect(
            &browser.post(paths::BASKET_SUBMIT, ""),
            "/order/burger-joint",
        );
        let basket = browser.basket();
        assert!(basket.is_empty());
        assert_eq!(basket.total_amount, "0.00");

        // Customers don't see the orders of the restaurant
        assert_redirect(&browser.get(paths::ORDERS), paths::LOGIN);

        assert_redirect(
            &browser.post(paths::LOGIN, "username=chef&restLink=burger-joint"),
            paths::ORDERS,
        );
        let pending = browser.orders(paths::ORDERS);
        assert_eq!(
            pending,
            vec![Order {
                completed: false,
                items_info: BTreeMap::from([("Burger".to_string(), 2), ("Fries".to_string(), 1)]),
                buyer: "alice".to_string(),
                total_amount: "12.50".to_string(),
            }]
        );

        assert_redirect(&browser.post(paths::ORDER_COMPLETE, "index=0"), paths::ORDERS);
        assert!(browser.orders(paths::ORDERS).is_empty());
        let completed = browser.orders(paths::ORDERS_COMPLETED);
        assert_eq!(completed.len(), 1);
        assert!(completed[0].completed);
        assert_eq!(completed[0].buyer, "alice");
    }

    #[test]
    fn test_complete_out_of_range() {
        let mut browser = Browser::new();
        browser.post(paths::LOGIN, "username=chef&restLink=burger-joint");

        let response = browser.post(paths::ORDER_COMPLETE, "index=0");
        assert_eq!(response.status, Some(400));
        assert!(response.body.contains("out of range"));

        let response = browser.post(paths::ORDER_COMPLETE, "index=first");
        assert_eq!(response.status, Some(500));
    }

    #[test]
    fn test_errors() {
        let mut browser = Browser::new();
        assert_eq!(browser.get("/nowhere").status, Some(404));
        assert_eq!(browser.post(paths::BASKET_SUBMIT, "").status, Some(400));
        assert_eq!(browser.post(paths::BASKET_REMOVE, BURGER).status, Some(400));
        assert_eq!(browser.post(paths::LOGIN, "").status, Some(500));

        browser.post(paths::LOGIN, "username=alice");
        // Missing price
        let response = browser.post(
            paths::BASKET_ADD,
            "restLink=burger-joint&itemName=Burger&itemLink=burger",
        );
        assert_eq!(response.status, Some(500));
        // Link that would escape the orders directory
        let response = browser.post(
            paths::BASKET_ADD,
            "restLink=..%2Fsecret&itemName=Burger&itemPrice=5.00&itemLink=burger",
        );
        assert_eq!(response.status, Some(400));
        // Link whose pending record is the completed record of burger-joint
        let response = browser.post(
            paths::BASKET_ADD,
            "restLink=completed-burger-joint&itemName=Burger&itemPrice=5.00&itemLink=burger",
        );
        assert_eq!(response.status, Some(400));
        assert!(browser.basket().is_empty());

        let response = browser.post(paths::LOGIN, "username=chef&restLink=completed-burger-joint");
        assert_eq!(response.status, Some(400));
    }

    #[test]
    fn test_corrupt_basket_slot() {
        let mut browser = Browser::new();
        browser.post(paths::LOGIN, "username=alice");

        let id = browser.session.clone().unwrap();
        let mut session = browser.services.sessions.load(&id).unwrap().unwrap();
        session.set(session::slots::BASKET, &"not a basket").unwrap();
        browser.services.sessions.save(&session).unwrap();

        assert_eq!(browser.post(paths::BASKET_ADD, BURGER).status, Some(500));
    }
}
