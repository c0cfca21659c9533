//! Lua bindings: the `m3d` math table, the `KEY` constants table, and the
//! per-frame input record.
//!
//! Vectors and matrices cross the boundary as userdata wrapping glam values,
//! so scripts never see host memory. Type mismatches surface as Lua runtime
//! errors that the host catches; nothing here panics on bad script input.

use glam::{Mat4, Vec3};
use mlua::prelude::*;

use scriptcam_input::{CamKey, InputSnapshot};

use crate::m3d;

/// Script-side 3D vector. Value semantics; every operation returns a new one.
#[derive(Debug, Clone, Copy)]
pub struct LuaVec3(pub Vec3);

/// Script-side 4x4 matrix. Only multiplication is exposed as an operator;
/// construction goes through the `m3d` free functions.
#[derive(Debug, Clone, Copy)]
pub struct LuaMat4(pub Mat4);

impl LuaUserData for LuaVec3 {
    fn add_fields<F: LuaUserDataFields<Self>>(fields: &mut F) {
        fields.add_field_method_get("x", |_, this| Ok(this.0.x));
        fields.add_field_method_get("y", |_, this| Ok(this.0.y));
        fields.add_field_method_get("z", |_, this| Ok(this.0.z));
        fields.add_field_method_set("x", |_, this, v: f32| {
            this.0.x = v;
            Ok(())
        });
        fields.add_field_method_set("y", |_, this, v: f32| {
            this.0.y = v;
            Ok(())
        });
        fields.add_field_method_set("z", |_, this, v: f32| {
            this.0.z = v;
            Ok(())
        });
    }

    fn add_methods<M: LuaUserDataMethods<Self>>(methods: &mut M) {
        methods.add_method("dot", |_, this, other: LuaUserDataRef<LuaVec3>| {
            Ok(this.0.dot(other.0))
        });
        methods.add_method("cross", |_, this, other: LuaUserDataRef<LuaVec3>| {
            Ok(LuaVec3(this.0.cross(other.0)))
        });
        methods.add_method("norm", |_, this, ()| Ok(LuaVec3(m3d::normalize(this.0))));

        methods.add_meta_method(LuaMetaMethod::Add, |_, this, other: LuaUserDataRef<LuaVec3>| {
            Ok(LuaVec3(this.0 + other.0))
        });
        methods.add_meta_method(LuaMetaMethod::Sub, |_, this, other: LuaUserDataRef<LuaVec3>| {
            Ok(LuaVec3(this.0 - other.0))
        });
        methods.add_meta_method(LuaMetaMethod::Unm, |_, this, ()| Ok(LuaVec3(-this.0)));

        // Lua hands `__mul` its operands in source order, so the vector may
        // sit on either side of the scalar.
        methods.add_meta_function(LuaMetaMethod::Mul, |_, (a, b): (LuaValue, LuaValue)| {
            scaled(&a, &b)
                .or_else(|| scaled(&b, &a))
                .map(LuaVec3)
                .ok_or_else(|| {
                    LuaError::runtime("vec3 `*` expects (vec3, number) or (number, vec3)")
                })
        });
    }
}

fn scaled(vec: &LuaValue, scalar: &LuaValue) -> Option<Vec3> {
    let v = vec.as_userdata()?.borrow::<LuaVec3>().ok()?;
    let s = scalar.as_number()?;
    Some(v.0 * s as f32)
}

impl LuaUserData for LuaMat4 {
    fn add_methods<M: LuaUserDataMethods<Self>>(methods: &mut M) {
        methods.add_meta_method(LuaMetaMethod::Mul, |_, this, other: LuaUserDataRef<LuaMat4>| {
            Ok(LuaMat4(this.0 * other.0))
        });
    }
}

/// Register the `m3d` and `KEY` globals on a fresh interpreter.
pub fn register(lua: &Lua) -> LuaResult<()> {
    let m3d_tbl = lua.create_table()?;

    m3d_tbl.set(
        "vec3",
        lua.create_function(|_, (x, y, z): (Option<f32>, Option<f32>, Option<f32>)| {
            Ok(LuaVec3(Vec3::new(
                x.unwrap_or(0.0),
                y.unwrap_or(0.0),
                z.unwrap_or(0.0),
            )))
        })?,
    )?;

    m3d_tbl.set(
        "mat4_identity",
        lua.create_function(|_, ()| Ok(LuaMat4(Mat4::IDENTITY)))?,
    )?;
    m3d_tbl.set(
        "mat4_mul",
        lua.create_function(
            |_, (a, b): (LuaUserDataRef<LuaMat4>, LuaUserDataRef<LuaMat4>)| {
                Ok(LuaMat4(a.0 * b.0))
            },
        )?,
    )?;
    m3d_tbl.set(
        "mat4_translate",
        lua.create_function(|_, v: LuaUserDataRef<LuaVec3>| Ok(LuaMat4(m3d::translate(v.0))))?,
    )?;
    m3d_tbl.set(
        "mat4_rotate_x",
        lua.create_function(|_, angle: f32| Ok(LuaMat4(m3d::rotate_x(angle))))?,
    )?;
    m3d_tbl.set(
        "mat4_rotate_y",
        lua.create_function(|_, angle: f32| Ok(LuaMat4(m3d::rotate_y(angle))))?,
    )?;
    m3d_tbl.set(
        "mat4_perspective",
        lua.create_function(|_, (fovy, aspect, near, far): (f32, f32, f32, f32)| {
            Ok(LuaMat4(m3d::perspective(fovy, aspect, near, far)))
        })?,
    )?;
    m3d_tbl.set(
        "mat4_lookat",
        lua.create_function(
            |_,
             (eye, center, up): (
                LuaUserDataRef<LuaVec3>,
                LuaUserDataRef<LuaVec3>,
                LuaUserDataRef<LuaVec3>,
            )| { Ok(LuaMat4(m3d::look_at(eye.0, center.0, up.0))) },
        )?,
    )?;

    lua.globals().set("m3d", m3d_tbl)?;

    let key_tbl = lua.create_table()?;
    for key in CamKey::ALL {
        key_tbl.set(key.name(), key.bit() as i64)?;
    }
    lua.globals().set("KEY", key_tbl)?;

    Ok(())
}

/// Build the per-call input record handed to the script's `update`.
pub fn input_table(lua: &Lua, input: &InputSnapshot) -> LuaResult<LuaTable> {
    let t = lua.create_table_with_capacity(0, 5)?;
    t.set("keys", input.keys.bits() as i64)?;
    t.set("pressed", input.pressed.bits() as i64)?;
    t.set("released", input.released.bits() as i64)?;
    t.set("mouse_dx", input.mouse_delta.x)?;
    t.set("mouse_dy", input.mouse_delta.y)?;
    Ok(t)
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;
    use scriptcam_input::KeyMask;

    fn fresh() -> Lua {
        let lua = Lua::new();
        register(&lua).unwrap();
        lua
    }

    fn eval_vec(lua: &Lua, chunk: &str) -> Vec3 {
        let v: LuaUserDataRef<LuaVec3> = lua.load(chunk).eval().unwrap();
        v.0
    }

    fn eval_mat(lua: &Lua, chunk: &str) -> Mat4 {
        let m: LuaUserDataRef<LuaMat4> = lua.load(chunk).eval().unwrap();
        m.0
    }

    #[test]
    fn vec3_constructor_defaults_to_zero() {
        let lua = fresh();
        assert_eq!(eval_vec(&lua, "return m3d.vec3()"), Vec3::ZERO);
        assert_eq!(
            eval_vec(&lua, "return m3d.vec3(1.5)"),
            Vec3::new(1.5, 0.0, 0.0)
        );
        assert_eq!(
            eval_vec(&lua, "return m3d.vec3(1, 2, 3)"),
            Vec3::new(1.0, 2.0, 3.0)
        );
    }

    #[test]
    fn vec3_fields_read_and_write() {
        let lua = fresh();
        let v = eval_vec(&lua, "local v = m3d.vec3(1, 2, 3) v.y = 9 return v");
        assert_eq!(v, Vec3::new(1.0, 9.0, 3.0));
    }

    #[test]
    fn vec3_arithmetic_operators() {
        let lua = fresh();
        assert_eq!(
            eval_vec(&lua, "return m3d.vec3(1, 2, 3) + m3d.vec3(10, 20, 30)"),
            Vec3::new(11.0, 22.0, 33.0)
        );
        assert_eq!(
            eval_vec(&lua, "return m3d.vec3(5, 5, 5) - m3d.vec3(1, 2, 3)"),
            Vec3::new(4.0, 3.0, 2.0)
        );
        assert_eq!(
            eval_vec(&lua, "return -m3d.vec3(1, -2, 3)"),
            Vec3::new(-1.0, 2.0, -3.0)
        );
    }

    #[test]
    fn vec3_scales_with_scalar_on_either_side() {
        let lua = fresh();
        assert_eq!(
            eval_vec(&lua, "return m3d.vec3(1, 2, 3) * 2"),
            Vec3::new(2.0, 4.0, 6.0)
        );
        assert_eq!(
            eval_vec(&lua, "return 2 * m3d.vec3(1, 2, 3)"),
            Vec3::new(2.0, 4.0, 6.0)
        );
    }

    #[test]
    fn vec3_methods() {
        let lua = fresh();
        let dot: f32 = lua
            .load("return m3d.vec3(1, 2, 3):dot(m3d.vec3(4, 5, 6))")
            .eval()
            .unwrap();
        assert_eq!(dot, 32.0);

        assert_eq!(
            eval_vec(&lua, "return m3d.vec3(1, 0, 0):cross(m3d.vec3(0, 1, 0))"),
            Vec3::Z
        );
        // Zero-length norm stays zero rather than going NaN.
        assert_eq!(eval_vec(&lua, "return m3d.vec3():norm()"), Vec3::ZERO);
    }

    #[test]
    fn wrong_operand_types_raise_lua_errors() {
        let lua = fresh();
        assert!(lua
            .load("return m3d.vec3(1, 0, 0) + 5")
            .eval::<LuaValue>()
            .is_err());
        assert!(lua
            .load("return m3d.vec3(1, 0, 0) * m3d.vec3(0, 1, 0)")
            .eval::<LuaValue>()
            .is_err());
        assert!(lua
            .load("return m3d.mat4_translate(42)")
            .eval::<LuaValue>()
            .is_err());
    }

    #[test]
    fn mat4_identity_and_mul() {
        let lua = fresh();
        let m = eval_mat(
            &lua,
            "return m3d.mat4_mul(m3d.mat4_identity(), m3d.mat4_translate(m3d.vec3(1, 2, 3)))",
        );
        assert_eq!(m, Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0)));

        let op = eval_mat(
            &lua,
            "return m3d.mat4_identity() * m3d.mat4_translate(m3d.vec3(1, 2, 3))",
        );
        assert_eq!(op, m);
    }

    #[test]
    fn mat4_translate_is_column_major() {
        let lua = fresh();
        let m = eval_mat(&lua, "return m3d.mat4_translate(m3d.vec3(1, 0, 0))");
        assert_eq!(m.to_cols_array()[12], 1.0);
    }

    #[test]
    fn key_table_matches_host_encoding() {
        let lua = fresh();
        let keys: LuaTable = lua.globals().get("KEY").unwrap();
        for key in CamKey::ALL {
            let bit: i64 = keys.get(key.name()).unwrap();
            assert_eq!(bit as u64, key.bit(), "{} bit drifted", key.name());
        }
    }

    #[test]
    fn input_record_carries_masks_and_mouse() {
        let lua = fresh();
        let snap = InputSnapshot::new(
            CamKey::Left.into(),
            KeyMask::EMPTY,
            Vec2::new(3.5, -1.25),
            1.0 / 60.0,
        );
        let t = input_table(&lua, &snap).unwrap();
        assert_eq!(t.get::<i64>("keys").unwrap(), CamKey::Left.bit() as i64);
        assert_eq!(t.get::<i64>("pressed").unwrap(), CamKey::Left.bit() as i64);
        assert_eq!(t.get::<i64>("released").unwrap(), 0);
        assert_eq!(t.get::<f32>("mouse_dx").unwrap(), 3.5);
        assert_eq!(t.get::<f32>("mouse_dy").unwrap(), -1.25);
    }
}
