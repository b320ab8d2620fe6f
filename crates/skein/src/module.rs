//! The linked result of compiling one Thrift document, and the public
//! `dumps`/`loads` entry points.

use std::collections::HashMap;
use std::sync::Arc;

use indexmap::IndexMap;

use skein_wire::{
    BinaryReader, BinaryWriter, MessageHeader, MessageKind, TType, Value as WireValue, WriteBuffer,
};

use crate::compile::Scope;
use crate::errors::{Error, UnknownExceptionError, ValueError};
use crate::primitive::Primitive;
use crate::spec::{ConstSpec, ServiceSpec, SpecArena, TypeId, TypeSpec};
use crate::value::Value;

/// A resolved constant.
#[derive(Debug, Clone, PartialEq)]
pub struct Constant {
    pub type_id: TypeId,
    pub value: Value,
}

/// Whether an implicit envelope type is a function's request or response.
#[derive(Debug, Clone, PartialEq, Eq)]
enum EnvelopeKind {
    Request { oneway: bool },
    Response,
}

#[derive(Debug, Clone)]
struct EnvelopeEntry {
    function: String,
    type_id: TypeId,
    kind: EnvelopeKind,
}

/// An unwrapped message envelope with its decoded body.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub name: String,
    pub seqid: i32,
    pub kind: MessageKind,
    pub body: Value,
}

/// An immutable compiled Thrift module: every linked spec plus the
/// serialization entry points.
///
/// Linked modules are freely shareable across threads for read-only use.
#[derive(Debug)]
pub struct Module {
    name: String,
    arena: SpecArena,
    types: IndexMap<String, TypeId>,
    services: IndexMap<String, ServiceSpec>,
    constants: IndexMap<String, Constant>,
    includes: IndexMap<String, Arc<Module>>,
    /// Implicit request/response type names to their functions.
    envelopes: HashMap<String, EnvelopeEntry>,
}

impl Module {
    /// Freeze a linked scope into a module.
    pub(crate) fn assemble(scope: Scope) -> Module {
        let constants = scope
            .constants
            .into_iter()
            .map(|(name, spec)| {
                let ConstSpec { spec, value, .. } = spec;
                (
                    name,
                    Constant {
                        type_id: spec.id(),
                        value: value.expect("constant was not resolved by the linker"),
                    },
                )
            })
            .collect();

        let mut envelopes = HashMap::new();
        for service in scope.services.values() {
            for func in service.functions_by_name().values() {
                envelopes.insert(
                    scope.arena.name(func.args),
                    EnvelopeEntry {
                        function: func.name.clone(),
                        type_id: func.args,
                        kind: EnvelopeKind::Request {
                            oneway: func.oneway,
                        },
                    },
                );
                if let Some(result) = func.result {
                    envelopes.insert(
                        scope.arena.name(result),
                        EnvelopeEntry {
                            function: func.name.clone(),
                            type_id: result,
                            kind: EnvelopeKind::Response,
                        },
                    );
                }
            }
        }

        Module {
            name: scope.name,
            arena: scope.arena,
            types: scope.types,
            services: scope.services,
            constants,
            includes: scope.includes,
            envelopes,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The spec arena. Bridge operations hang off it, addressed by
    /// [`TypeId`].
    pub fn arena(&self) -> &SpecArena {
        &self.arena
    }

    /// Id of a declared (or primitive) type.
    pub fn type_id(&self, name: &str) -> Option<TypeId> {
        self.types.get(name).copied()
    }

    /// Names of all declared types, in declaration order.
    pub fn type_names(&self) -> impl Iterator<Item = &str> {
        self.types.keys().map(String::as_str)
    }

    pub fn service(&self, name: &str) -> Option<&ServiceSpec> {
        self.services.get(name)
    }

    pub fn constant(&self, name: &str) -> Option<&Value> {
        self.constants.get(name).map(|c| &c.value)
    }

    pub fn include(&self, name: &str) -> Option<&Arc<Module>> {
        self.includes.get(name)
    }

    /// Look up a qualified type across includes, returning the owning
    /// module along with the id into its arena.
    pub(crate) fn find_type(self: &Arc<Self>, name: &str) -> Option<(Arc<Module>, TypeId)> {
        if let Some((include, rest)) = name.split_once('.') {
            return self.includes.get(include)?.find_type(rest);
        }
        self.types.get(name).map(|&id| (Arc::clone(self), id))
    }

    /// A constant's primitive form; understands `Enum.Item` and
    /// include-qualified names.
    pub(crate) fn find_constant(&self, name: &str) -> Option<Primitive> {
        if let Some((first, rest)) = name.split_once('.') {
            if let Some(&id) = self.types.get(first) {
                if let TypeSpec::Enum(spec) = self.arena.get(id) {
                    return spec.value_of(rest).map(|v| Primitive::Int(v as i64));
                }
            }
            return self.includes.get(first)?.find_constant(rest);
        }
        let constant = self.constants.get(name)?;
        self.arena.to_primitive(constant.type_id, &constant.value).ok()
    }

    /// The spec a struct value with this type name serializes under:
    /// declared types first, then implicit request/response types.
    fn spec_named(&self, type_name: &str) -> Option<TypeId> {
        self.types
            .get(type_name)
            .copied()
            .or_else(|| self.envelopes.get(type_name).map(|e| e.type_id))
    }

    fn bound_spec(&self, value: &Value) -> Result<(TypeId, String), Error> {
        let type_name = match value {
            Value::Struct(s) => s.type_name().to_string(),
            other => {
                return Err(ValueError::TypeMismatch {
                    expected: "a struct, union, or exception value".to_string(),
                    actual: other.kind().to_string(),
                }
                .into())
            }
        };
        let id = self.spec_named(&type_name).ok_or_else(|| {
            Error::Value(ValueError::TypeMismatch {
                expected: format!("a type of module \"{}\"", self.name),
                actual: type_name.clone(),
            })
        })?;
        Ok((id, type_name))
    }

    // --- Construction ---

    /// Construct a struct, union, or exception value by field name.
    pub fn instantiate(
        &self,
        type_name: &str,
        fields: Vec<(&str, Value)>,
    ) -> Result<Value, Error> {
        let id = self.spec_named(type_name).ok_or_else(|| {
            Error::Value(ValueError::TypeMismatch {
                expected: format!("a type of module \"{}\"", self.name),
                actual: type_name.to_string(),
            })
        })?;
        let named = fields
            .into_iter()
            .map(|(name, value)| (name.to_string(), value))
            .collect();
        match self.arena.get(id) {
            TypeSpec::Struct(spec) => spec.instantiate(&self.arena, named),
            TypeSpec::Union(spec) => spec.instantiate(&self.arena, named),
            _ => Err(ValueError::TypeMismatch {
                expected: "a struct, union, or exception type".to_string(),
                actual: type_name.to_string(),
            }
            .into()),
        }
    }

    /// Construct a struct value positionally: required fields without
    /// defaults first, then the rest, in declaration order.
    pub fn instantiate_positional(
        &self,
        type_name: &str,
        args: Vec<Value>,
    ) -> Result<Value, Error> {
        let id = self.spec_named(type_name).ok_or_else(|| {
            Error::Value(ValueError::TypeMismatch {
                expected: format!("a type of module \"{}\"", self.name),
                actual: type_name.to_string(),
            })
        })?;
        match self.arena.get(id) {
            TypeSpec::Struct(spec) => spec.instantiate_positional(&self.arena, args),
            _ => Err(ValueError::TypeMismatch {
                expected: "a struct or exception type".to_string(),
                actual: type_name.to_string(),
            }
            .into()),
        }
    }

    // --- Bridge passthroughs by type name ---

    pub fn validate(&self, type_name: &str, value: &Value) -> Result<(), Error> {
        self.named_op(type_name, |id| self.arena.validate(id, value))
    }

    pub fn to_wire(&self, type_name: &str, value: &Value) -> Result<WireValue, Error> {
        self.named_op(type_name, |id| self.arena.to_wire(id, value))
    }

    pub fn from_wire(&self, type_name: &str, wire: &WireValue) -> Result<Value, Error> {
        self.named_op(type_name, |id| self.arena.from_wire(id, wire))
    }

    pub fn to_primitive(&self, type_name: &str, value: &Value) -> Result<Primitive, Error> {
        self.named_op(type_name, |id| self.arena.to_primitive(id, value))
    }

    pub fn from_primitive(&self, type_name: &str, primitive: &Primitive) -> Result<Value, Error> {
        self.named_op(type_name, |id| self.arena.from_primitive(id, primitive))
    }

    fn named_op<T>(
        &self,
        type_name: &str,
        op: impl FnOnce(TypeId) -> Result<T, Error>,
    ) -> Result<T, Error> {
        let id = self.spec_named(type_name).ok_or_else(|| {
            Error::Value(ValueError::TypeMismatch {
                expected: format!("a type of module \"{}\"", self.name),
                actual: type_name.to_string(),
            })
        })?;
        op(id)
    }

    // --- Serialization entry points ---

    /// Serialize a value of a declared (or implicit) type to bytes.
    pub fn dumps(&self, value: &Value) -> Result<Vec<u8>, Error> {
        let (id, _) = self.bound_spec(value)?;
        let mut buffer = WriteBuffer::new();
        self.arena
            .write_to(id, &mut BinaryWriter::new(&mut buffer), value)?;
        Ok(buffer.into_bytes())
    }

    /// Deserialize bytes into a value of the named type.
    pub fn loads(&self, type_name: &str, bytes: &[u8]) -> Result<Value, Error> {
        self.named_op(type_name, |id| {
            self.arena.read_from(id, &mut BinaryReader::new(bytes))
        })
    }

    /// Serialize a request or response value inside a strict message
    /// envelope. Requests become CALL (or ONEWAY for oneway functions),
    /// responses become REPLY.
    pub fn dumps_message(&self, value: &Value, seqid: i32) -> Result<Vec<u8>, Error> {
        let (id, type_name) = self.bound_spec(value)?;
        let entry = self.envelopes.get(&type_name).ok_or_else(|| {
            Error::Value(ValueError::TypeMismatch {
                expected: "a request or response value".to_string(),
                actual: type_name.clone(),
            })
        })?;
        debug_assert_eq!(entry.type_id, id);

        let kind = match entry.kind {
            EnvelopeKind::Request { oneway: false } => MessageKind::Call,
            EnvelopeKind::Request { oneway: true } => MessageKind::Oneway,
            EnvelopeKind::Response => MessageKind::Reply,
        };

        let mut buffer = WriteBuffer::new();
        let mut writer = BinaryWriter::new(&mut buffer);
        writer.write_message_begin(&MessageHeader {
            name: entry.function.clone(),
            kind,
            seqid,
        });
        self.arena.write_to(entry.type_id, &mut writer, value)?;
        Ok(buffer.into_bytes())
    }

    /// Unwrap a message envelope addressed to the given service and decode
    /// its body with the named function's request or response spec.
    pub fn loads_message(&self, service: &str, bytes: &[u8]) -> Result<Message, Error> {
        let service_spec = self.services.get(service).ok_or_else(|| {
            Error::UnknownService {
                service: service.to_string(),
            }
        })?;

        let mut reader = BinaryReader::new(bytes);
        let header = reader.read_message_begin()?;

        if header.kind == MessageKind::Exception {
            let wire = match reader.read_value(TType::Struct)? {
                WireValue::Struct(s) => s,
                _ => unreachable!("read_value(Struct) yields a struct"),
            };
            return Err(UnknownExceptionError {
                message: format!(
                    "\"{}\" returned an exception from the remote side",
                    header.name
                ),
                response: wire,
            }
            .into());
        }

        let func = service_spec.function(&header.name).ok_or_else(|| {
            Error::UnknownFunction {
                service: service.to_string(),
                function: header.name.clone(),
            }
        })?;

        let body_spec = match header.kind {
            MessageKind::Call | MessageKind::Oneway => func.args,
            MessageKind::Reply => func.result.ok_or_else(|| Error::UnexpectedReply {
                service: service.to_string(),
                function: header.name.clone(),
            })?,
            MessageKind::Exception => unreachable!("handled above"),
        };

        let body = self.arena.read_from(body_spec, &mut reader)?;
        Ok(Message {
            name: header.name,
            seqid: header.seqid,
            kind: header.kind,
            body,
        })
    }
}
