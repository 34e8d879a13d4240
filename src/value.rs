use std::borrow::Cow;

use async_graphql_value::ConstValue;
use indexmap::IndexMap;

/// Names a concrete kind in the schema.
///
/// The name is the key the kind is registered under in the
/// [`TypeRegistry`](crate::TypeRegistry); there is no fallback to the Rust
/// type name.
pub trait GraphQLType {
    const TYPE_NAME: &'static str;
}

/// Field data produced by a data-access strategy.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Data {
    #[default]
    Null,
    Value(ConstValue),
    Node(Node),
    List(Vec<Data>),
}

impl Data {
    pub fn is_null(&self) -> bool {
        matches!(self, Data::Null)
    }

    pub fn as_value(&self) -> Option<&ConstValue> {
        match self {
            Data::Value(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_node(&self) -> Option<&Node> {
        match self {
            Data::Node(n) => Some(n),
            _ => None,
        }
    }
}

/// A runtime value of a concrete kind.
///
/// Carries the kind's type name alongside its field data so that
/// interface-typed fields can be resolved to an object type at execution time.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    type_name: Cow<'static, str>,
    fields: IndexMap<String, Data>,
}

impl Node {
    pub fn new(type_name: impl Into<Cow<'static, str>>) -> Self {
        Self {
            type_name: type_name.into(),
            fields: IndexMap::new(),
        }
    }

    pub fn of<T: GraphQLType>() -> Self {
        Self::new(T::TYPE_NAME)
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<Data>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn get(&self, name: &str) -> Option<&Data> {
        self.fields.get(name)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &Data)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl From<ConstValue> for Data {
    fn from(value: ConstValue) -> Self {
        match value {
            ConstValue::Null => Data::Null,
            other => Data::Value(other),
        }
    }
}

impl From<Node> for Data {
    fn from(node: Node) -> Self {
        Data::Node(node)
    }
}

impl From<&str> for Data {
    fn from(s: &str) -> Self {
        Data::Value(ConstValue::String(s.to_string()))
    }
}

impl From<String> for Data {
    fn from(s: String) -> Self {
        Data::Value(ConstValue::String(s))
    }
}

impl From<i32> for Data {
    fn from(n: i32) -> Self {
        Data::Value(ConstValue::Number((n as i64).into()))
    }
}

impl From<i64> for Data {
    fn from(n: i64) -> Self {
        Data::Value(ConstValue::Number(n.into()))
    }
}

impl From<f64> for Data {
    fn from(n: f64) -> Self {
        serde_json::Number::from_f64(n)
            .map(|n| Data::Value(ConstValue::Number(n)))
            .unwrap_or(Data::Null)
    }
}

impl From<bool> for Data {
    fn from(b: bool) -> Self {
        Data::Value(ConstValue::Boolean(b))
    }
}

impl<T: Into<Data>> From<Option<T>> for Data {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => v.into(),
            None => Data::Null,
        }
    }
}

impl<T: Into<Data>> From<Vec<T>> for Data {
    fn from(items: Vec<T>) -> Self {
        Data::List(items.into_iter().map(Into::into).collect())
    }
}
