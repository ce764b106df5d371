//! # Frontend Specifications
//!
//! Headless client logic for the Posta-AI frontend: everything behaviour,
//! nothing presentational.
//!
//! ## Overall Payloads
//!
//! Requests between the frontend and backend.
//!
//! ### Field autosave
//! - JSON POST to `/api/updateBio`: `{ userId, valor, campo, tabela }`
//! - `tabela` is one of `User`, `Perfil`, `Pessoal`
//! - 200 gives `{ message }`, anything else gives `{ error }`
//!
//! ### Feed / dashboard
//! - `GET /api/posts` (optional `?search=`), `GET /api/finances`
//! - All contribution aggregation happens here, over the fetched list
//!
//!
//!
//! ## Flow
//!
//! - Every keystroke runs the field's display mask and updates local state
//!   immediately, so the input always reflects the mask
//! - Saves are debounced by 800 ms: only the last edit in a quiet window
//!   reaches the network
//! - The response sets a transient field-scoped message; identical messages
//!   bump a revision counter so the entrance animation re-triggers
//! - Network failure shows a generic message, no retry, no value rollback
//! - A parent refresh overwrites any unsaved local edit (last writer wins)
//!
//!
//!
//! ## Address autofill
//!
//! - CEP input is cleaned to digits; only exactly 8 digits trigger a lookup
//! - ViaCEP answers with street/district/city/state; each field is pushed
//!   through the regular autosave endpoint, tabela `Perfil`
pub mod cep;
pub mod dashboard;
pub mod debounce;
pub mod field;
pub mod mask;
