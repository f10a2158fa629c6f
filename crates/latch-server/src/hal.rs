//! HAL (`application/hal+json`) document builders
//!
//! Lock and resource documents are served as HAL resources: plain
//! properties plus `_links` and `_embedded` sections. Serialization is
//! recursive over embedded resources.

use std::collections::BTreeMap;

use serde_json::{Map, Value, json};

pub const HAL_CONTENT_TYPE: &str = "application/hal+json";

/// A HAL link object
#[derive(Clone, Debug)]
pub struct Link {
    href: String,
    title: Option<String>,
}

impl Link {
    pub fn new(href: &str) -> Self {
        Self {
            href: href.to_string(),
            title: None,
        }
    }

    pub fn with_title(href: &str, title: &str) -> Self {
        Self {
            href: href.to_string(),
            title: Some(title.to_string()),
        }
    }

    fn to_value(&self) -> Value {
        match &self.title {
            Some(title) => json!({ "href": self.href, "title": title }),
            None => json!({ "href": self.href }),
        }
    }
}

/// Per-rel link slot: a single link or a collection
#[derive(Clone, Debug)]
enum LinkSlot {
    Single(Link),
    Multiple(Vec<Link>),
}

/// A HAL resource object
#[derive(Clone, Debug)]
pub struct HalResource {
    properties: Map<String, Value>,
    links: BTreeMap<String, LinkSlot>,
    embedded: BTreeMap<String, Vec<HalResource>>,
}

impl HalResource {
    /// Create a resource with its `self` link.
    pub fn new(href: &str) -> Self {
        let mut resource = Self {
            properties: Map::new(),
            links: BTreeMap::new(),
            embedded: BTreeMap::new(),
        };
        resource.add_link("self", Link::new(href));
        resource
    }

    /// Create a resource whose properties come from a serializable value
    /// (must serialize to a JSON object).
    pub fn with_properties(href: &str, properties: &impl serde::Serialize) -> Self {
        let mut resource = Self::new(href);
        if let Ok(Value::Object(map)) = serde_json::to_value(properties) {
            resource.properties = map;
        }
        resource
    }

    pub fn add_property(&mut self, name: &str, value: Value) -> &mut Self {
        self.properties.insert(name.to_string(), value);
        self
    }

    /// Set a single link for a rel type, replacing any previous one.
    pub fn add_link(&mut self, rel: &str, link: Link) -> &mut Self {
        self.links.insert(rel.to_string(), LinkSlot::Single(link));
        self
    }

    /// Append a link to a rel type that allows multiple links.
    pub fn add_link_to_collection(&mut self, rel: &str, link: Link) -> &mut Self {
        match self
            .links
            .entry(rel.to_string())
            .or_insert_with(|| LinkSlot::Multiple(Vec::new()))
        {
            LinkSlot::Multiple(links) => links.push(link),
            LinkSlot::Single(_) => {}
        }
        self
    }

    /// Append an embedded resource to a named collection.
    pub fn add_embedded(&mut self, collection: &str, resource: HalResource) -> &mut Self {
        self.embedded
            .entry(collection.to_string())
            .or_default()
            .push(resource);
        self
    }

    /// Render the document, `_embedded` included only when non-empty.
    pub fn to_value(&self) -> Value {
        let mut document = self.properties.clone();
        let mut links = Map::new();
        for (rel, slot) in &self.links {
            let value = match slot {
                LinkSlot::Single(link) => link.to_value(),
                LinkSlot::Multiple(collection) => {
                    Value::Array(collection.iter().map(Link::to_value).collect())
                }
            };
            links.insert(rel.clone(), value);
        }
        document.insert("_links".to_string(), Value::Object(links));
        if !self.embedded.is_empty() {
            let mut embedded = Map::new();
            for (collection, resources) in &self.embedded {
                embedded.insert(
                    collection.clone(),
                    Value::Array(resources.iter().map(HalResource::to_value).collect()),
                );
            }
            document.insert("_embedded".to_string(), Value::Object(embedded));
        }
        Value::Object(document)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_link_with_and_without_title() {
        let plain = Link::new("/foo").to_value();
        assert_eq!(plain["href"], "/foo");
        assert!(plain.get("title").is_none());

        let titled = Link::with_title("/foo", "bar").to_value();
        assert_eq!(titled["href"], "/foo");
        assert_eq!(titled["title"], "bar");
    }

    #[test]
    fn test_self_link() {
        let document = HalResource::new("/foo").to_value();
        assert_eq!(document["_links"]["self"]["href"], "/foo");
        assert!(document.get("_embedded").is_none());
    }

    #[test]
    fn test_properties() {
        let mut resource = HalResource::new("/foo");
        resource.add_property("key1", json!("value1"));
        resource.add_property("key2", json!("value2"));
        let document = resource.to_value();
        assert_eq!(document["key1"], "value1");
        assert_eq!(document["key2"], "value2");
    }

    #[test]
    fn test_embedded_resources() {
        let mut outer = HalResource::new("/foo");
        let mut inner = HalResource::new("/bar");
        inner.add_property("key3", json!("value3"));
        outer.add_embedded("bars", inner);
        let document = outer.to_value();
        assert_eq!(document["_embedded"]["bars"][0]["key3"], "value3");
        assert_eq!(document["_embedded"]["bars"][0]["_links"]["self"]["href"], "/bar");
    }

    #[test]
    fn test_link_collection() {
        let mut resource = HalResource::new("/resources");
        resource.add_link_to_collection("resource", Link::with_title("/resources/a", "a"));
        resource.add_link_to_collection("resource", Link::with_title("/resources/b", "b"));
        let document = resource.to_value();
        assert_eq!(document["_links"]["resource"][0]["href"], "/resources/a");
        assert_eq!(document["_links"]["resource"][1]["title"], "b");
    }
}
