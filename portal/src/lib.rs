// Life of a request:
// 1. The listener hands every request to `apps::dispatch`
// 2. The first label of `Host` picks www, admin, or api
// 3. admin: the session cookie is MAC-checked, then the token inside it is
//    verified; an expired token that is still renewable is re-issued and
//    the cookie rewritten on the response
// 4. api: the bearer token is verified strictly, never renewed
// 5. Handlers read the resulting identity and answer
//
// System components:
//  - Token authenticator (issue / verify / renew)
//  - Cookie and bearer front-ends over a framework-neutral request context
//  - Credential store
//  - Sub-app routers

pub mod apps;
pub mod auth;
pub mod config;
pub mod context;
pub mod time;

mod testing;
