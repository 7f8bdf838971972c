// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! yawl-core: specification model (C1), case data store (C2), event
//! records, error taxonomy, ids and clock shared by every other crate in
//! the workspace.

pub mod macros;

pub mod case_data;
pub mod clock;
pub mod error;
pub mod event;
pub mod id;
pub mod ids;
pub mod session;
pub mod spec;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use case_data::{CaseDataError, CaseDocument};
pub use clock::{Clock, FakeClock, SystemClock};
pub use error::{
    AuthError, BusyError, ConflictError, EngineError, ExceptionHandlerError, LogError,
    NetSemanticError, NotFoundError, ValidationError,
};
pub use event::{EventKind, EventRecord};
pub use id::{short, IdBuf};
pub use ids::{CaseId, InstanceSuffix, WorkitemId};
pub use session::{Principal, Scope, ScopeSet, SessionHandle, SESSION_TTL_MS};
pub use spec::{
    Condition, ConditionId, CreationMode, Decomposition, DecompositionId, Diagnostic, Flow,
    JoinType, LegacySpecRef, MiBounds, Net, NetId, Place, Severity, SpecId, SpecificationModel,
    SplitType, Task, TaskId,
};
pub use spec::document::{JsonSpecLoader, SpecDocumentError, SpecLoader};
