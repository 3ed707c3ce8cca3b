//! Minimal trellis example — sessions, CSRF, and a couple of routes.
//!
//! Run with:
//!   RUST_LOG=debug cargo run --example basic
//!
//! Try:
//!   curl -c jar.txt http://localhost:8000/token
//!   curl -b jar.txt -X POST http://localhost:8000/greet \
//!        -H "X-CSRF-Token: <token from the previous response>"
//!   curl http://localhost:8000/users/42
//!   curl http://localhost:8000/static/css/site.css

use trellis::{App, CsrfProtection, Request, Response, Result, Server, SessionMiddleware};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let csrf = CsrfProtection::new();
    let issuer = csrf.clone();

    let app = App::new()
        .wrap(SessionMiddleware::new())
        .wrap(csrf)
        .get("/users/<id>", get_user)
        .get("/static/*", static_stub)
        .get("/token", move |req: Request| {
            let issuer = issuer.clone();
            async move {
                let token = issuer.generate_token();
                req.session().unwrap().insert("csrftoken", token.clone());
                Ok::<_, trellis::Error>(Response::text(token))
            }
        })
        .post("/greet", greet);

    Server::bind("0.0.0.0:8000")
        .serve(app)
        .await
        .expect("server error");
}

// GET /users/<id>
async fn get_user(req: Request) -> Result<Response> {
    let id = req.param("id").unwrap_or("unknown");
    Ok(Response::json(format!(r#"{{"id":"{id}","name":"alice"}}"#).into_bytes()))
}

// GET /static/* — a wildcard route swallows any remaining depth.
async fn static_stub(req: Request) -> Result<Response> {
    Ok(Response::text(format!("would serve {}", req.path())))
}

// POST /greet — reachable only with a valid CSRF token (see /token).
async fn greet(req: Request) -> Result<Response> {
    let name = req.query("name").unwrap_or("world");
    Ok(Response::text(format!("hello, {name}")))
}
