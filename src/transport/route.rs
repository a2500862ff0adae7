use std::fmt::Display;

use super::error::TransportError;

/// Route template for per-customer order queries
pub const ORDERS_ROUTE: &str = "orders.{customerId}";

/// A route with a single `{variable}` placeholder, e.g. `orders.{customerId}`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteTemplate {
    prefix: String,
    variable: String,
    suffix: String,
}

impl RouteTemplate {
    /// Parse a template containing exactly one placeholder
    pub fn parse(template: &str) -> Result<Self, TransportError> {
        let invalid = || TransportError::InvalidRoute(template.to_string());

        let open = template.find('{').ok_or_else(invalid)?;
        let close = template[open..].find('}').map(|i| open + i).ok_or_else(invalid)?;
        let variable = &template[open + 1..close];
        let suffix = &template[close + 1..];

        if variable.is_empty() || variable.contains('{') || suffix.contains(['{', '}']) {
            return Err(invalid());
        }

        Ok(Self {
            prefix: template[..open].to_string(),
            variable: variable.to_string(),
            suffix: suffix.to_string(),
        })
    }

    /// Name of the placeholder variable
    pub fn variable(&self) -> &str {
        &self.variable
    }

    /// Substitute a value for the placeholder
    pub fn expand(&self, value: impl Display) -> String {
        format!("{}{}{}", self.prefix, value, self.suffix)
    }

    /// Extract the placeholder value from a concrete route
    pub fn extract<'a>(&self, route: &'a str) -> Option<&'a str> {
        let value = route
            .strip_prefix(self.prefix.as_str())?
            .strip_suffix(self.suffix.as_str())?;
        (!value.is_empty()).then_some(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_orders_template() {
        let template = RouteTemplate::parse(ORDERS_ROUTE).unwrap();
        assert_eq!(template.variable(), "customerId");
    }

    #[test]
    fn expands_and_extracts_key() {
        let template = RouteTemplate::parse(ORDERS_ROUTE).unwrap();
        let route = template.expand(42);

        assert_eq!(route, "orders.42");
        assert_eq!(template.extract(&route), Some("42"));
    }

    #[test]
    fn supports_suffix_after_placeholder() {
        let template = RouteTemplate::parse("orders.{cid}.stream").unwrap();

        assert_eq!(template.expand(7), "orders.7.stream");
        assert_eq!(template.extract("orders.7.stream"), Some("7"));
        assert_eq!(template.extract("orders.7"), None);
    }

    #[test]
    fn extract_rejects_other_routes() {
        let template = RouteTemplate::parse(ORDERS_ROUTE).unwrap();

        assert_eq!(template.extract("customers.1"), None);
        assert_eq!(template.extract("orders."), None);
    }

    #[test]
    fn rejects_templates_without_single_placeholder() {
        assert!(matches!(
            RouteTemplate::parse("orders"),
            Err(TransportError::InvalidRoute(_))
        ));
        assert!(matches!(
            RouteTemplate::parse("orders.{}"),
            Err(TransportError::InvalidRoute(_))
        ));
        assert!(matches!(
            RouteTemplate::parse("orders.{a}.{b}"),
            Err(TransportError::InvalidRoute(_))
        ));
        assert!(matches!(
            RouteTemplate::parse("orders.{a"),
            Err(TransportError::InvalidRoute(_))
        ));
    }
}
