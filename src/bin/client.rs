use common::api::fields;
use common::cli::*;
use common::errors::Result;
use common::http::{code_to_string, session_from_response, HttpClient, Response};
use common::routes::{self, paths};
use url::form_urlencoded;

#[derive(Debug, PartialEq)]
enum Action {
    Login,
    Add,
    Remove,
    Empty,
    Submit,
    Basket,
    Orders,
    Completed,
    Complete,
}

#[derive(Debug)]
struct CLIOptions {
    target: String,
    action: Action,
    args: Vec<String>,
}

fn parse_action(action: String) -> std::result::Result<Action, CLIError> {
    match action.to_ascii_lowercase().as_str() {
        "login" => Ok(Action::Login),
        "add" => Ok(Action::Add),
        "remove" => Ok(Action::Remove),
        "empty" => Ok(Action::Empty),
        "submit" => Ok(Action::Submit),
        "basket" => Ok(Action::Basket),
        "orders" => Ok(Action::Orders),
        "completed" => Ok(Action::Completed),
        "complete" => Ok(Action::Complete),
        _ => Err(CLIError::InvalidParameter),
    }
}

/// `client [target] <action> [args...]`, the target defaults to BASKET_ADDRESS then DEFAULT_ADDRESS
fn parse_cli_args<I>(mut args: I, default_target: &str) -> Result<CLIOptions>
where
    I: Iterator<Item = String>,
{
    args.next(); // Skip the program name
    let maybe_target = args
        .next()
        .ok_or(CLIError::MissingParameter("target or action"))?;

    let (target, action) = match validate_address(maybe_target.as_str()) {
        Ok(target) => (
            target.to_string(),
            args.next()
                .ok_or(CLIError::MissingParameter("action"))
                .and_then(parse_action)?,
        ),
        Err(_) => (default_target.to_string(), parse_action(maybe_target)?),
    };

    Ok(CLIOptions {
        target,
        action,
        args: args.collect(),
    })
}

/// Encode the positional arguments as a form, every field is required
fn form_from_args(names: &[&'static str], args: &[String]) -> Result<String> {
    let mut form = form_urlencoded::Serializer::new(String::new());
    for (i, name) in names.iter().enumerate() {
        let value = args.get(i).ok_or(CLIError::MissingParameter(*name))?;
        form.append_pair(name, value);
    }
    Ok(form.finish())
}

fn print_response(response: &Response) {
    match response.status {
        Some(code) => println!("Response Status: {} - {}", code, code_to_string(code)),
        None => println!("No status in response"),
    }
    if let Some(location) = response.header("Location") {
        println!("Location: {}", location);
    }
    if let Some(session) = session_from_response(response) {
        println!("Session: {}", session);
    }
    if !response.body.is_empty() {
        match serde_json::from_str::<serde_json::Value>(&response.body)
            .and_then(|json| serde_json::to_string_pretty(&json))
        {
            Ok(json) => println!("Response Body:\n{}", json),
            Err(_) => println!("Response Body: {}", response.body),
        }
    }
}

fn run(options: CLIOptions, session: Option<String>) -> Result<Response> {
    let mut client = HttpClient::new(&options.target)?;
    let session = session.as_deref();

    let (method, endpoint, form) = match options.action {
        Action::Login => {
            let mut form = form_from_args(&[fields::USERNAME], &options.args)?;
            if let Some(rest_link) = options.args.get(1) {
                form.push('&');
                form.push_str(&form_from_args(&[fields::REST_LINK], &[rest_link.clone()])?);
            }
            ("POST", paths::LOGIN.to_string(), form)
        }
        Action::Add => (
            "POST",
            paths::BASKET_ADD.to_string(),
            form_from_args(
                &[
                    fields::REST_LINK,
                    fields::ITEM_NAME,
                    fields::ITEM_PRICE,
                    fields::ITEM_LINK,
                ],
                &options.args,
            )?,
        ),
        Action::Remove => (
            "POST",
            paths::BASKET_REMOVE.to_string(),
            form_from_args(
                &[fields::ITEM_NAME, fields::ITEM_PRICE, fields::ITEM_LINK],
                &options.args,
            )?,
        ),
        Action::Empty => ("POST", paths::BASKET_EMPTY.to_string(), String::new()),
        Action::Submit => ("POST", paths::BASKET_SUBMIT.to_string(), String::new()),
        Action::Basket => {
            let rest_link = options.args.first().map(String::as_str).unwrap_or("");
            ("GET", routes::order_view(rest_link), String::new())
        }
        Action::Orders => ("GET", paths::ORDERS.to_string(), String::new()),
        Action::Completed => ("GET", paths::ORDERS_COMPLETED.to_string(), String::new()),
        Action::Complete => (
            "POST",
            paths::ORDER_COMPLETE.to_string(),
            form_from_args(&[fields::INDEX], &options.args)?,
        ),
    };

    log::debug!("{} {} {:?}", method, endpoint, form);
    client.send_form(method, &endpoint, &form, session)
}

fn main() -> Result<()> {
    pretty_env_logger::init();

    let default_target = std::env::var(env_vars::ADDRESS)
        .ok()
        .filter(|address| validate_address(address).is_ok())
        .unwrap_or_else(|| DEFAULT_ADDRESS.to_string());
    let options = parse_cli_args(std::env::args(), &default_target)?;
    let session = std::env::var(env_vars::SESSION)
        .ok()
        .filter(|id| !id.is_empty());

    let response = run(options, session)?;
    print_response(&response);
    Ok(())
}
