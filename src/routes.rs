use std::collections::HashMap;

use crate::endpoints::Services;
use crate::{
    errors,
    http::{Request, Response},
};
use errors::{Error, Result};
use matchit::Router;

/// Declare the HTTP paths of the service. Each one gets a constant holding the path in `paths`
/// and one holding its route id in `endpoints`, matchit maps the former to the latter.
macro_rules! make_paths {
    ($($name:ident: $path:expr,)*) => {
        pub mod paths {
            $(
                pub const $name: &str = $path;
            )*
        }
        pub mod endpoints {
            $(
                pub const $name: &str = stringify!($name);
            )*
        }
    }
}

make_paths! {
    LOGIN: "/login",
    BASKET_ADD: "/basket/add",
    BASKET_EMPTY: "/basket/empty",
    BASKET_REMOVE: "/basket/remove",
    BASKET_SUBMIT: "/basket/submit",
    ORDER_VIEW: "/order/{rest_link}",
    ORDERS: "/orders",
    ORDERS_COMPLETED: "/orders/completed",
    ORDER_COMPLETE: "/orders/complete",
}

/// Register paths declared with `make_paths!` in a matchit router
macro_rules! add_path{
    ($router:ident $(, $path:ident)*) => {
        $(
            $router.insert(paths::$path, endpoints::$path)?;
        )*
    }
}

/// Names of the parameters captured in the paths
pub mod params {
    /// Restaurant whose order page is shown
    pub const REST_LINK: &str = "rest_link";
}

/// Where customers land when they are not logged in as restaurant staff
pub const HOME: &str = "/";

/// Return the HTTP path of the order page of a restaurant
pub fn order_view(rest_link: &str) -> String {
    paths::ORDER_VIEW.replace("{rest_link}", rest_link)
}

/// Matchit router knowing every path of the service
///
/// Fails only if the paths above conflict with each other.
fn new_router() -> errors::Result<Router<&'static str>> {
    let mut router = Router::new();
    add_path!(
        router,
        LOGIN,
        BASKET_ADD,
        BASKET_EMPTY,
        BASKET_REMOVE,
        BASKET_SUBMIT,
        ORDER_VIEW,
        ORDERS,
        ORDERS_COMPLETED,
        ORDER_COMPLETE
    );
    Ok(router)
}

/// Parameters captured in the path, by name
pub type HttpParams = HashMap<String, String>;
/// Request handler, it gets the services shared by every request
pub type HttpHandler = fn(Request, HttpParams, &Services) -> Result<Response>;

/// Dispatches requests to the handler registered for their path and method
pub struct HttpRouter {
    routes: Router<&'static str>,
    /// Route id -> method -> handler
    handlers: HashMap<&'static str, HashMap<&'static str, HttpHandler>>,
}

impl HttpRouter {
    /// Router with every path known but no handler yet
    pub fn new() -> Result<Self> {
        let routes = new_router()?;
        Ok(HttpRouter {
            routes,
            handlers: HashMap::new(),
        })
    }

    /// Handle `method` requests on the route `route` (one of the `endpoints` ids) with `handler`
    pub fn add_route(&mut self, method: &'static str, route: &'static str, handler: HttpHandler) {
        let method_to_handler = self.handlers.entry(route).or_default();
        method_to_handler.insert(method, handler);
    }

    /// Call the handler matching the request and return what it returns
    ///
    /// The query string is ignored. Unknown paths give NotFound, known paths requested with a
    /// method nothing handles give MethodNotAllowed.
    pub fn route(&self, request: Request, services: &Services) -> Result<Response> {
        let path = request.path.split('?').next().unwrap_or_default();
        let route = self
            .routes
            .at(path)
            .map_err(|err| Error::NotFound(format!("{}: {}", path, err)))?;

        let handler = self
            .handlers
            .get(route.value)
            .and_then(|method_to_handler| method_to_handler.get(request.method.as_str()))
            .ok_or_else(|| Error::MethodNotAllowed(format!("{} {}", request.method, path)))?;

        let route_params: HttpParams = route
            .params
            .iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        handler(request, route_params, services)
    }
}
