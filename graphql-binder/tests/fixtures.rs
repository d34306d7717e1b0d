//! A small library of users and posts bound to a schema.

use graphql_binder::Arguments;
use graphql_binder::FieldError;
use graphql_binder::FieldValue;
use graphql_binder::MethodTable;
use graphql_binder::Methods;
use graphql_binder::MutationRoot;
use graphql_binder::ParamType;
use graphql_binder::QueryRoot;
use graphql_binder::Resolver;
use graphql_binder::ReturnType;
use graphql_binder::ScalarKind;
use graphql_binder::Schema;
use graphql_binder::SchemaBuilder;
use serde::Deserialize;

pub(crate) const SCHEMA: &str = r#"
type Query {
  active: Boolean
  echo(message: String): String
  shout(message: String!): String
  matches(input: Filter): Boolean
  me: User!
  user(id: ID!): User
  search(term: String): [SearchResult!]!
  node(id: ID!): Node
}

type Mutation {
  rename(id: ID!, name: String!): User
}

input Filter {
  name: String
  tags: [String!] = []
}

interface Node {
  id: ID!
}

type User implements Node {
  id: ID!
  name: String!
  admin: Boolean!
  "Computed by the user handlers"
  greeting(prefix: String = "Hello"): String!
  role: Role @deprecated(reason: "Use `admin`")
  posts: [Post!]!
}

type Post implements Node {
  id: ID!
  title: String
  author: User!
}

extend type Post {
  wordCount: Int!
}

union SearchResult = User | Post

enum Role {
  ADMIN
  MEMBER @deprecated
}
"#;

const STRING: ReturnType = ReturnType::Scalar(ScalarKind::String);
const BOOLEAN: ReturnType = ReturnType::Scalar(ScalarKind::Boolean);
const ID: ReturnType = ReturnType::Scalar(ScalarKind::Id);

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct User {
    pub(crate) id: String,
    pub(crate) name: String,
    pub(crate) admin: bool,
}

impl User {
    pub(crate) fn ada() -> Self {
        Self {
            id: "1".to_string(),
            name: "Ada".to_string(),
            admin: true,
        }
    }

    pub(crate) fn grace() -> Self {
        Self {
            id: "2".to_string(),
            name: "Grace".to_string(),
            admin: false,
        }
    }

    fn find(id: Option<&str>) -> Option<Self> {
        [Self::ada(), Self::grace()]
            .into_iter()
            .find(|user| Some(user.id.as_str()) == id)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Post {
    pub(crate) id: String,
    pub(crate) title: String,
    pub(crate) author: User,
}

impl Post {
    pub(crate) fn first() -> Self {
        Self {
            id: "10".to_string(),
            title: "Notes on the analytical engine".to_string(),
            author: User::ada(),
        }
    }
}

pub(crate) enum Role {}

#[derive(Debug, Deserialize)]
pub(crate) struct Filter {
    pub(crate) name: Option<String>,
    #[serde(default)]
    pub(crate) tags: Vec<String>,
}

impl Methods for User {
    fn method_table() -> MethodTable {
        MethodTable::builder::<Self>()
            .method("id", [], ID, |user, _| Ok(user.id.as_str().into()))
            .method("getName", [], STRING, |user, _| {
                Ok(user.name.as_str().into())
            })
            .method("isAdmin", [], BOOLEAN, |user, _| Ok(user.admin.into()))
            .method("role", [], ReturnType::enumeration::<Role>(), |user, _| {
                Ok(if user.admin { "ADMIN" } else { "MEMBER" }.into())
            })
            .method(
                "posts",
                [],
                ReturnType::list(ReturnType::object::<Post>()),
                |user, _| {
                    let posts = [Post::first()]
                        .into_iter()
                        .filter(|post| post.author.id == user.id)
                        .map(FieldValue::object)
                        .collect::<Vec<_>>();
                    Ok(FieldValue::List(posts))
                },
            )
            .build()
    }
}

impl Methods for Post {
    fn method_table() -> MethodTable {
        MethodTable::builder::<Self>()
            .method("id", [], ID, |post, _| Ok(post.id.as_str().into()))
            .method("title", [], STRING, |post, _| {
                Ok(post.title.as_str().into())
            })
            .method("author", [], ReturnType::object::<User>(), |post, _| {
                Ok(FieldValue::object(post.author.clone()))
            })
            .method(
                "getWordCount",
                [],
                ReturnType::Scalar(ScalarKind::Int),
                |post, _| Ok((post.title.split_whitespace().count() as i64).into()),
            )
            .build()
    }
}

/// Fields of `User` computed outside the user itself.
pub(crate) struct UserHandlers;

impl Methods for UserHandlers {
    fn method_table() -> MethodTable {
        MethodTable::builder::<Self>()
            .method(
                "greeting",
                [ParamType::data::<User>(), ParamType::Scalar(ScalarKind::String)],
                STRING,
                |_, arguments: &Arguments| {
                    let user = arguments
                        .source::<User>(0)
                        .ok_or_else(|| FieldError::resolver("no user"))?;
                    let prefix = arguments.str(1).unwrap_or("Hi");
                    Ok(format!("{prefix}, {}", user.name).into())
                },
            )
            .build()
    }
}

impl Resolver for UserHandlers {
    type Data = User;
}

/// The signed-in user, stored in the request extensions.
#[derive(Clone, Debug)]
pub(crate) struct Viewer(pub(crate) User);

pub(crate) struct QueryHandlers;

impl Methods for QueryHandlers {
    fn method_table() -> MethodTable {
        MethodTable::builder::<Self>()
            .method("active", [], BOOLEAN, |_, _| Ok(true.into()))
            .method(
                "echo",
                [ParamType::Scalar(ScalarKind::String)],
                STRING,
                |_, arguments| Ok(arguments.str(0).into()),
            )
            .method(
                "shout",
                [ParamType::Scalar(ScalarKind::String)],
                STRING,
                |_, arguments| Ok(arguments.str(0).map(str::to_uppercase).into()),
            )
            .method(
                "matches",
                [ParamType::input::<Filter>()],
                BOOLEAN,
                |_, arguments| {
                    let matched = arguments
                        .input::<Filter>(0)
                        .is_some_and(|filter| filter.name.as_deref() == Some("x"));
                    Ok(matched.into())
                },
            )
            .method(
                "me",
                [ParamType::RequestContext],
                ReturnType::object::<User>(),
                |_, arguments| {
                    let viewer = arguments
                        .context(0)
                        .and_then(|context| context.extensions().get::<Viewer>())
                        .ok_or_else(|| FieldError::resolver("not signed in"))?;
                    Ok(FieldValue::object(viewer.0.clone()))
                },
            )
            .method(
                "user",
                [ParamType::Scalar(ScalarKind::Id)],
                ReturnType::optional(ReturnType::object::<User>()),
                |_, arguments| Ok(User::find(arguments.str(0)).map(FieldValue::object).into()),
            )
            .method(
                "search",
                [ParamType::Scalar(ScalarKind::String)],
                ReturnType::list(ReturnType::Abstract),
                |_, _| {
                    Ok(FieldValue::List(vec![
                        FieldValue::object(User::grace()),
                        FieldValue::object(Post::first()),
                    ]))
                },
            )
            .method(
                "node",
                [ParamType::Scalar(ScalarKind::Id)],
                ReturnType::Abstract,
                |_, arguments| {
                    let post = Post::first();
                    Ok(match arguments.str(0) {
                        Some(id) if id == post.id => FieldValue::object(post),
                        id => User::find(id).map(FieldValue::object).into(),
                    })
                },
            )
            .build()
    }
}

impl Resolver for QueryHandlers {
    type Data = QueryRoot;
}

pub(crate) struct MutationHandlers;

impl Methods for MutationHandlers {
    fn method_table() -> MethodTable {
        MethodTable::builder::<Self>()
            .method(
                "rename",
                [
                    ParamType::Scalar(ScalarKind::Id),
                    ParamType::Scalar(ScalarKind::String),
                ],
                ReturnType::optional(ReturnType::object::<User>()),
                |_, arguments| {
                    let renamed = User::find(arguments.str(0)).map(|user| User {
                        name: arguments.str(1).unwrap_or_default().to_string(),
                        ..user
                    });
                    Ok(renamed.map(FieldValue::object).into())
                },
            )
            .build()
    }
}

impl Resolver for MutationHandlers {
    type Data = MutationRoot;
}

pub(crate) fn builder() -> SchemaBuilder {
    SchemaBuilder::parse(SCHEMA)
        .unwrap_or_else(|error| panic!("{error}"))
        .handler_group(QueryHandlers)
        .handler_group(MutationHandlers)
        .handler_group(UserHandlers)
        .data_type::<User>()
        .data_type::<Post>()
}

pub(crate) fn schema() -> Schema {
    builder().build().unwrap_or_else(|error| panic!("{error}"))
}
