pub mod jsonapi;

pub use jsonapi::{
    build_serializer_args, default_context, serialize_collection, serialize_single,
    LinkBuilder, SerializeContext, SerializeError, SerializerArgs, ShapedResource,
};
